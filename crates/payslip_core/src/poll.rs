use crate::{JobStatus, PreviewProgress, ProgressSnapshot};

/// Sequence number of an issued poll request, increasing per watch.
pub type PollSeq = u64;

/// A poll response that carries a job status.
pub trait PollStatus {
    fn job_status(&self) -> JobStatus;
}

impl PollStatus for ProgressSnapshot {
    fn job_status(&self) -> JobStatus {
        self.status
    }
}

impl PollStatus for PreviewProgress {
    fn job_status(&self) -> JobStatus {
        self.status
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollVerdict<T> {
    /// Newest non-terminal response so far.
    Updated(T),
    /// First terminal response. The watch is over.
    Finished(T),
    /// Issued before a response that was already applied.
    Stale,
    /// Arrived after the watch finished, or was never issued.
    Ignored,
}

/// Orders poll responses by issue sequence rather than arrival.
///
/// Requests overlap when a response takes longer than the poll interval, so a
/// slow answer may land after a faster, later one. Only responses newer than
/// the last applied one are surfaced. Terminal responses always win: a job
/// that reported `SUCCESS` or `FAILURE` cannot go back to running.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollTracker {
    next_seq: PollSeq,
    last_applied: Option<PollSeq>,
    finished: bool,
}

impl PollTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves the sequence number of the next request, or `None` once finished.
    pub fn issue(&mut self) -> Option<PollSeq> {
        if self.finished {
            return None;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        Some(seq)
    }

    pub fn accept<T: PollStatus>(&mut self, seq: PollSeq, response: T) -> PollVerdict<T> {
        if self.finished || seq >= self.next_seq {
            return PollVerdict::Ignored;
        }
        if response.job_status().is_terminal() {
            self.finished = true;
            self.last_applied = Some(self.last_applied.map_or(seq, |last| last.max(seq)));
            return PollVerdict::Finished(response);
        }
        if self.last_applied.is_some_and(|last| seq <= last) {
            return PollVerdict::Stale;
        }
        self.last_applied = Some(seq);
        PollVerdict::Updated(response)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of requests issued so far.
    pub fn issued(&self) -> u64 {
        self.next_seq
    }
}
