use payslip_core::{LogId, LogStatus, Msg, PageMove};

/// Commands accepted on the recipient selection screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionCommand {
    Toggle(Vec<String>),
    ToggleAll,
    Search(String),
    Confirm,
    Cancel,
    Help,
}

/// Commands accepted by the log browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogCommand {
    Next,
    Previous,
    Page(u64),
    Status(Option<LogStatus>),
    Search(String),
    Delete(LogId),
    Quit,
    Help,
}

pub const SELECTION_HELP: &str = "\
  t <matricule>...   toggle recipients
  a                  select / unselect all eligible recipients
  / <text>           filter by name, matricule or email (empty clears)
  c                  confirm and send to the selected recipients
  q                  close without sending";

pub const LOG_HELP: &str = "\
  n / p              next / previous page
  g <page>           go to page
  s <status|all>     filter by status (sent, failed, pending)
  / <text>           search (empty clears)
  d <id>             delete a log entry
  q                  quit";

pub fn parse_selection(line: &str) -> Result<SelectionCommand, String> {
    let (head, rest) = split_command(line);
    match head {
        "t" | "toggle" => {
            let matricules: Vec<String> = rest.split_whitespace().map(str::to_string).collect();
            if matricules.is_empty() {
                return Err("toggle needs at least one matricule".to_string());
            }
            Ok(SelectionCommand::Toggle(matricules))
        }
        "a" | "all" => Ok(SelectionCommand::ToggleAll),
        "/" | "search" => Ok(SelectionCommand::Search(rest.to_string())),
        "c" | "confirm" => Ok(SelectionCommand::Confirm),
        "q" | "quit" | "cancel" => Ok(SelectionCommand::Cancel),
        "?" | "h" | "help" | "" => Ok(SelectionCommand::Help),
        other => Err(format!("unknown command `{other}`")),
    }
}

pub fn parse_log_command(line: &str) -> Result<LogCommand, String> {
    let (head, rest) = split_command(line);
    match head {
        "n" | "next" => Ok(LogCommand::Next),
        "p" | "prev" | "previous" => Ok(LogCommand::Previous),
        "g" | "page" => rest
            .parse::<u64>()
            .map(LogCommand::Page)
            .map_err(|_| format!("`{rest}` is not a page number")),
        "s" | "status" => match rest {
            "" | "all" => Ok(LogCommand::Status(None)),
            status => status
                .parse::<LogStatus>()
                .map(|status| LogCommand::Status(Some(status)))
                .map_err(|err| err.to_string()),
        },
        "/" | "search" => Ok(LogCommand::Search(rest.to_string())),
        "d" | "delete" => rest
            .parse::<LogId>()
            .map(LogCommand::Delete)
            .map_err(|_| format!("`{rest}` is not a log id")),
        "q" | "quit" => Ok(LogCommand::Quit),
        "?" | "h" | "help" | "" => Ok(LogCommand::Help),
        other => Err(format!("unknown command `{other}`")),
    }
}

impl SelectionCommand {
    /// Messages for the core; `Help` maps to none.
    pub fn into_msgs(self) -> Vec<Msg> {
        match self {
            SelectionCommand::Toggle(matricules) => {
                matricules.into_iter().map(Msg::RecipientToggled).collect()
            }
            SelectionCommand::ToggleAll => vec![Msg::AllRecipientsToggled],
            SelectionCommand::Search(text) => vec![Msg::RecipientSearchChanged(text)],
            SelectionCommand::Confirm => vec![Msg::ConfirmClicked],
            SelectionCommand::Cancel => vec![Msg::SelectionClosed],
            SelectionCommand::Help => Vec::new(),
        }
    }
}

impl LogCommand {
    /// The message for the core, if the command is not handled locally.
    pub fn into_msg(self) -> Option<Msg> {
        match self {
            LogCommand::Next => Some(Msg::LogPageRequested(PageMove::Next)),
            LogCommand::Previous => Some(Msg::LogPageRequested(PageMove::Previous)),
            LogCommand::Page(page) => Some(Msg::LogPageRequested(PageMove::To(page))),
            LogCommand::Status(status) => Some(Msg::LogStatusFilterChanged(status)),
            LogCommand::Search(text) => Some(Msg::LogSearchChanged(text)),
            LogCommand::Delete(id) => Some(Msg::DeleteLogClicked(id)),
            LogCommand::Quit | LogCommand::Help => None,
        }
    }
}

fn split_command(line: &str) -> (&str, &str) {
    let line = line.trim();
    if let Some(rest) = line.strip_prefix('/') {
        return ("/", rest.trim());
    }
    match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    }
}
