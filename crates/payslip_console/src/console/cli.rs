use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use payslip_core::{DateRange, LogStatus, PayslipMonth};

use super::persistence::{API_URL_ENV, CONFIG_FILENAME};

/// Bulk payslip distribution from the command line.
#[derive(Debug, Parser)]
#[command(name = "payslip_console", version)]
pub struct Cli {
    /// Settings file (RON).
    #[arg(long, global = true, default_value = CONFIG_FILENAME)]
    pub config: PathBuf,

    /// Backend base URL, overriding the settings file.
    #[arg(long, global = true, env = API_URL_ENV)]
    pub api_url: Option<String>,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Sign in and store the session.
    Login {
        #[arg(short, long)]
        username: Option<String>,
    },
    /// Forget the stored session.
    Logout,
    /// Upload a PDF and send every payslip it contains.
    Send { file: PathBuf },
    /// Upload a PDF, review the recipients, then send to the selected ones.
    Preview {
        file: PathBuf,
        /// Send to every eligible recipient without prompting.
        #[arg(short, long)]
        yes: bool,
    },
    /// Monthly send counts over a period.
    Summary {
        #[command(flatten)]
        period: PeriodArgs,
    },
    /// Browse, filter and delete send logs.
    Logs {
        #[command(flatten)]
        period: PeriodArgs,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,
        /// sent, failed or pending.
        #[arg(long)]
        status: Option<LogStatus>,
        #[arg(long)]
        search: Option<String>,
        /// Print the first page and exit.
        #[arg(long)]
        once: bool,
    },
    /// List the months with a payslip on record for an employee.
    Months { matricule: String },
    /// Send stored payslips to an employee again.
    Resend {
        matricule: String,
        /// Month to resend; repeat for several. Prompts when omitted.
        #[arg(long = "month", value_name = "YYYY-MM")]
        months: Vec<PayslipMonth>,
        /// Deliver to this address instead of the one on file.
        #[arg(long)]
        email: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, Default, Args)]
pub struct PeriodArgs {
    /// First day of the period.
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub start: Option<NaiveDate>,
    /// Last day of the period (defaults to today).
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("--start {start} is after --end {end}")]
pub struct ReversedPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PeriodArgs {
    /// Fills missing bounds from a `days`-long window ending today.
    pub fn resolve(&self, today: NaiveDate, days: u64) -> Result<DateRange, ReversedPeriod> {
        let end = self.end.unwrap_or(today);
        let start = self
            .start
            .unwrap_or_else(|| DateRange::last_days(end, days).start);
        let range = DateRange::new(start, end);
        if !range.is_ordered() {
            return Err(ReversedPeriod { start, end });
        }
        Ok(range)
    }
}

impl Command {
    pub fn period(&self) -> PeriodArgs {
        match self {
            Command::Summary { period } | Command::Logs { period, .. } => *period,
            _ => PeriodArgs::default(),
        }
    }

    pub fn requires_session(&self) -> bool {
        !matches!(self, Command::Login { .. } | Command::Logout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn resend_collects_repeated_months() {
        let cli = Cli::try_parse_from([
            "payslip_console",
            "resend",
            "M1",
            "--month",
            "2024-01",
            "--month",
            "2024-02",
        ])
        .unwrap();
        match cli.command {
            Command::Resend {
                matricule, months, ..
            } => {
                assert_eq!(matricule, "M1");
                assert_eq!(
                    months,
                    vec![
                        PayslipMonth {
                            year: 2024,
                            month: 1
                        },
                        PayslipMonth {
                            year: 2024,
                            month: 2
                        }
                    ]
                );
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(Cli::try_parse_from(["payslip_console", "resend", "M1", "--month", "2024-13"])
            .is_err());
        assert!(Cli::try_parse_from(["payslip_console", "logs", "--status", "bounced"]).is_err());
        assert!(Cli::try_parse_from(["payslip_console", "logs", "--month", "0"]).is_err());
    }

    #[test]
    fn logs_filters_are_parsed() {
        let cli = Cli::try_parse_from([
            "payslip_console",
            "logs",
            "--start",
            "2024-01-01",
            "--status",
            "failed",
            "--once",
        ])
        .unwrap();
        assert_eq!(cli.command.period().start, Some(date(2024, 1, 1)));
        match cli.command {
            Command::Logs { status, once, .. } => {
                assert_eq!(status, Some(LogStatus::Failed));
                assert!(once);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn period_defaults_to_window_ending_today() {
        let today = date(2024, 4, 30);
        let range = PeriodArgs::default().resolve(today, 90).unwrap();
        assert_eq!(range, DateRange::new(date(2024, 1, 31), today));
    }

    #[test]
    fn reversed_period_is_rejected() {
        let period = PeriodArgs {
            start: Some(date(2024, 5, 1)),
            end: Some(date(2024, 4, 1)),
        };
        let err = period.resolve(date(2024, 6, 1), 90).unwrap_err();
        assert_eq!(
            err,
            ReversedPeriod {
                start: date(2024, 5, 1),
                end: date(2024, 4, 1),
            }
        );
        assert_eq!(err.to_string(), "--start 2024-05-01 is after --end 2024-04-01");
    }

    #[test]
    fn only_login_and_logout_work_without_a_session() {
        assert!(!Command::Logout.requires_session());
        assert!(!Command::Login { username: None }.requires_session());
        assert!(Command::Months {
            matricule: "M1".to_string()
        }
        .requires_session());
    }
}
