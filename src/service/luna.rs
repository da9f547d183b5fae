use super::{
    parse_search_response, parse_status_response, ServiceCallError, SpellCheckService,
    SEARCH_METHOD, SET_LOCALE_METHOD,
};
use crate::{Config, SpellCheckResult};
use serde_json::json;
use std::io::{BufRead, BufReader};
#[cfg(unix)]
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Talks to the on-device SmartKey service through `luna-send`.
///
/// Every call spawns one shell process and reads a single line of JSON back.
pub struct LunaSendService {
    command: String,
    uri: String,
    timeout: Option<Duration>,
}

impl LunaSendService {
    pub fn new(command: impl Into<String>, uri: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            command: command.into(),
            uri: uri.into().trim_end_matches('/').to_string(),
            timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.service_command.clone(),
            config.service_uri.clone(),
            config.timeout_secs,
        )
    }

    /// Full shell command line for one call
    pub fn command_line(&self, method: &str, payload: &serde_json::Value) -> String {
        format!(
            "{} {}/{} '{}'",
            self.command,
            self.uri,
            method,
            encode_payload(payload)
        )
    }

    fn call(&self, method: &str, payload: serde_json::Value) -> Result<String, ServiceCallError> {
        let cmd = self.command_line(method, &payload);
        log::debug!("running: {}", cmd);

        let io_err = |source| ServiceCallError::Io {
            method: method.to_string(),
            source,
        };

        let mut command = Command::new("sh");
        command
            .arg("-c")
            .arg(&cmd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped());
        // Own process group, so a compound command can be killed as a whole
        #[cfg(unix)]
        command.process_group(0);
        let mut child = command.spawn().map_err(io_err)?;

        let stdout = child.stdout.take().ok_or_else(|| ServiceCallError::NoResponse {
            method: method.to_string(),
        })?;

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut line = String::new();
            let read = BufReader::new(stdout).read_line(&mut line).map(|_| line);
            let _ = tx.send(read);
        });

        let received = match self.timeout {
            Some(timeout) => rx.recv_timeout(timeout).map_err(|_| ServiceCallError::Timeout {
                method: method.to_string(),
                secs: timeout.as_secs(),
            }),
            None => rx.recv().map_err(|_| ServiceCallError::NoResponse {
                method: method.to_string(),
            }),
        };

        // luna-send -n 1 exits on its own after one reply; a hung one does not.
        terminate(&mut child);

        let line = received?.map_err(io_err)?;
        log::debug!("{} response: {}", method, line.trim_end());
        Ok(line)
    }
}

impl SpellCheckService for LunaSendService {
    fn check_spelling(&self, word: &str) -> Result<SpellCheckResult, ServiceCallError> {
        let line = self.call(SEARCH_METHOD, json!({ "query": word }))?;
        parse_search_response(&line)
    }

    fn set_locale(&self, locale: &str) -> Result<(), ServiceCallError> {
        let line = self.call(SET_LOCALE_METHOD, json!({ "locale": locale }))?;
        parse_status_response(SET_LOCALE_METHOD, &line)
    }
}

fn terminate(child: &mut Child) {
    #[cfg(unix)]
    if let Ok(None) = child.try_wait() {
        let group = format!("kill -KILL -- -{} 2>/dev/null", child.id());
        if let Err(err) = Command::new("sh").arg("-c").arg(&group).status() {
            log::warn!("could not kill process group {}: {}", child.id(), err);
        }
    }
    let _ = child.kill();
    let _ = child.wait();
}

/// Serialize a payload so it can sit inside a single-quoted shell argument.
///
/// Single quotes become the JSON escape `\u0027`, which decodes to the same string.
pub fn encode_payload(payload: &serde_json::Value) -> String {
    payload.to_string().replace('\'', "\\u0027")
}
