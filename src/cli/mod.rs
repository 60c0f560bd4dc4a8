use crate::app::{PickerError, show_picker};
use crate::domain::PickerResult;
use crate::infra::{
    Config, ConfigError, EnsureServerError, LaunchError, OpenCodeClient, ServiceError,
    SessionService, ensure_server_running, find_session_by_title, launch_session,
    parse_server_url,
};
use std::io::{self, Write};
use thiserror::Error;
use url::Url;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CliInvocation {
    PrintHelp,
    PrintVersion,
    Resume(ResumeRequest),
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ResumeRequest {
    /// Resume or create this title directly instead of opening the picker.
    pub title: Option<String>,
    pub server_url: Option<Url>,
}

#[derive(Debug, Error)]
pub enum CliParseError {
    #[error("unknown flag: {0}")]
    UnknownFlag(String),

    #[error("missing value for flag: {0}")]
    MissingFlagValue(String),

    #[error("invalid value for {flag}: {value}")]
    InvalidFlagValue { flag: String, value: String },

    #[error("unexpected argument: {0}")]
    UnexpectedArgument(String),
}

#[derive(Debug, Error)]
pub enum CliRunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(
        "Failed to start or connect to OpenCode server: {0}\nHint: start it manually with `opencode serve` and keep it running."
    )]
    Server(#[from] EnsureServerError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Picker(#[from] PickerError),

    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error(transparent)]
    WriteOutput(#[from] io::Error),

    #[error("failed to resolve current directory: {0}")]
    CurrentDir(#[source] io::Error),
}

pub fn parse_invocation(args: &[String]) -> Result<CliInvocation, CliParseError> {
    let flags = args.iter().skip(1).take_while(|arg| arg.as_str() != "--");
    for arg in flags {
        match arg.as_str() {
            "--help" | "-h" => return Ok(CliInvocation::PrintHelp),
            "--version" | "-V" => return Ok(CliInvocation::PrintVersion),
            _ => {}
        }
    }

    let mut request = ResumeRequest::default();
    let mut iter = args.iter().skip(1);
    let mut positional_only = false;
    while let Some(arg) = iter.next() {
        if !positional_only {
            match arg.as_str() {
                "--server" | "-s" => {
                    let value = iter
                        .next()
                        .ok_or_else(|| CliParseError::MissingFlagValue("--server".to_string()))?;
                    let url = parse_server_url(value).map_err(|_| {
                        CliParseError::InvalidFlagValue {
                            flag: "--server".to_string(),
                            value: value.to_string(),
                        }
                    })?;
                    request.server_url = Some(url);
                    continue;
                }
                "--" => {
                    positional_only = true;
                    continue;
                }
                _ if arg.starts_with('-') && arg.len() > 1 => {
                    return Err(CliParseError::UnknownFlag(arg.to_string()));
                }
                _ => {}
            }
        }

        if request.title.is_some() {
            return Err(CliParseError::UnexpectedArgument(arg.to_string()));
        }
        if !arg.trim().is_empty() {
            request.title = Some(arg.to_string());
        }
    }

    Ok(CliInvocation::Resume(request))
}

/// Makes sure the server is up, settles on a session for the current
/// directory, and hands the terminal to OpenCode. Returns OpenCode's exit code.
pub fn run(request: ResumeRequest) -> Result<i32, CliRunError> {
    let config = Config::from_env()?.with_server_url(request.server_url);
    let cwd = std::env::current_dir().map_err(CliRunError::CurrentDir)?;
    let directory = cwd.to_string_lossy().into_owned();
    let client = OpenCodeClient::new(&config);

    let mut out = io::stdout();
    ensure_server_running(&client, &config, &mut out)?;

    let choice = match request.title.as_deref() {
        Some(title) => resolve_title(&client, title, &directory, &mut out)?,
        None => show_picker(&client, &directory)?,
    };
    let session_id = open_session(&client, choice, &directory, &mut out)?;

    writeln!(out)?;
    out.flush()?;
    Ok(launch_session(&config, &session_id, &cwd)?)
}

fn resolve_title(
    service: &impl SessionService,
    title: &str,
    directory: &str,
    out: &mut impl Write,
) -> Result<PickerResult, CliRunError> {
    let Some(found) = find_session_by_title(service, title, directory)? else {
        return Ok(PickerResult::New {
            title: title.to_string(),
        });
    };

    if found.match_count > 1 {
        writeln!(
            out,
            "Found {} sessions matching \"{title}\", using most recent",
            found.match_count
        )?;
    }
    writeln!(out, "Resuming session: {}", found.session.title)?;
    Ok(PickerResult::Existing {
        session_id: found.session.id,
    })
}

fn open_session(
    service: &impl SessionService,
    choice: PickerResult,
    directory: &str,
    out: &mut impl Write,
) -> Result<String, CliRunError> {
    match choice {
        PickerResult::Existing { session_id } => {
            writeln!(out, "   ID: {session_id}")?;
            Ok(session_id)
        }
        PickerResult::New { title } => {
            writeln!(out, "Creating new session: {title}")?;
            let session_id = service.create(&title, directory)?;
            writeln!(out, "   Created with ID: {session_id}")?;
            Ok(session_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::fake::{FakeService, remote_session};

    const DIR: &str = "/work/api";

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    fn output(out: Vec<u8>) -> String {
        String::from_utf8(out).expect("utf8")
    }

    #[test]
    fn parse_defaults_to_picker_when_no_args() {
        let parsed = parse_invocation(&args(&["opencode-resume"])).expect("parse");
        assert_eq!(parsed, CliInvocation::Resume(ResumeRequest::default()));
    }

    #[test]
    fn parse_help_flag_wins() {
        let parsed = parse_invocation(&args(&["opencode-resume", "demo", "--help"])).expect("parse");
        assert_eq!(parsed, CliInvocation::PrintHelp);
        let parsed = parse_invocation(&args(&["opencode-resume", "-V"])).expect("parse");
        assert_eq!(parsed, CliInvocation::PrintVersion);
    }

    #[test]
    fn parse_title_and_server_flag() {
        let parsed = parse_invocation(&args(&[
            "opencode-resume",
            "--server",
            "http://127.0.0.1:5000",
            "API Server",
        ]))
        .expect("parse");
        assert_eq!(
            parsed,
            CliInvocation::Resume(ResumeRequest {
                title: Some("API Server".to_string()),
                server_url: Some(Url::parse("http://127.0.0.1:5000").expect("url")),
            })
        );
    }

    #[test]
    fn parse_double_dash_allows_dash_titles() {
        let parsed =
            parse_invocation(&args(&["opencode-resume", "--", "--help"])).expect("parse");
        assert_eq!(
            parsed,
            CliInvocation::Resume(ResumeRequest {
                title: Some("--help".to_string()),
                server_url: None,
            })
        );
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(matches!(
            parse_invocation(&args(&["opencode-resume", "--verbose"])),
            Err(CliParseError::UnknownFlag(_))
        ));
        assert!(matches!(
            parse_invocation(&args(&["opencode-resume", "--server"])),
            Err(CliParseError::MissingFlagValue(_))
        ));
        assert!(matches!(
            parse_invocation(&args(&["opencode-resume", "--server", "nope"])),
            Err(CliParseError::InvalidFlagValue { .. })
        ));
        assert!(matches!(
            parse_invocation(&args(&["opencode-resume", "one", "two"])),
            Err(CliParseError::UnexpectedArgument(_))
        ));
    }

    #[test]
    fn resolve_title_resumes_most_recent_normalized_match() {
        let service = FakeService {
            sessions: vec![
                remote_session("ses_old", "API Server", DIR, 1, 10),
                remote_session("ses_new", "api_server", DIR, 1, 20),
            ],
            ..FakeService::default()
        };
        let mut out = Vec::new();
        let choice = resolve_title(&service, "api server", DIR, &mut out).expect("resolve");
        assert_eq!(
            choice,
            PickerResult::Existing {
                session_id: "ses_new".to_string()
            }
        );
        let text = output(out);
        assert!(text.contains("Found 2 sessions matching \"api server\", using most recent"));
        assert!(text.contains("Resuming session: api_server"));
    }

    #[test]
    fn resolve_title_without_match_creates_new() {
        let service = FakeService::default();
        let mut out = Vec::new();
        let choice = resolve_title(&service, "demo", DIR, &mut out).expect("resolve");
        assert_eq!(
            choice,
            PickerResult::New {
                title: "demo".to_string()
            }
        );
        assert!(out.is_empty());
    }

    #[test]
    fn open_session_creates_new_sessions_in_directory() {
        let service = FakeService::default();
        let mut out = Vec::new();
        let id = open_session(
            &service,
            PickerResult::New {
                title: "general".to_string(),
            },
            DIR,
            &mut out,
        )
        .expect("open");
        assert_eq!(id, "ses_new_1");
        assert_eq!(
            service.created.lock().expect("lock").as_slice(),
            &[("general".to_string(), DIR.to_string())]
        );
        assert!(output(out).contains("Created with ID: ses_new_1"));
    }

    #[test]
    fn open_session_passes_existing_ids_through() {
        let service = FakeService::default();
        let mut out = Vec::new();
        let id = open_session(
            &service,
            PickerResult::Existing {
                session_id: "ses_9".to_string(),
            },
            DIR,
            &mut out,
        )
        .expect("open");
        assert_eq!(id, "ses_9");
        assert!(service.created.lock().expect("lock").is_empty());
    }

    #[test]
    fn create_failure_propagates() {
        let service = FakeService {
            unreachable: true,
            ..FakeService::default()
        };
        let mut out = Vec::new();
        let error = open_session(&service, PickerResult::new_session(""), DIR, &mut out)
            .expect_err("fails");
        assert!(matches!(error, CliRunError::Service(ServiceError::Unavailable { .. })));
    }
}
