use async_trait::async_trait;
use seedvault_core::{Error, Result};
use std::process::Output;

/// Trait for executing external commands
///
/// Lets command-line backed stores be tested without a real binary on the
/// path by swapping in a scripted implementation.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Execute a command with the given arguments and capture its output
    async fn execute(&self, cmd: &str, args: &[String]) -> Result<Output>;
}

/// Production implementation that executes real commands
///
/// The child is killed if the returned future is dropped, so a timed-out or
/// cancelled store call does not leave a process behind.
pub struct SystemCommandExecutor;

#[async_trait]
impl CommandExecutor for SystemCommandExecutor {
    async fn execute(&self, cmd: &str, args: &[String]) -> Result<Output> {
        tokio::process::Command::new(cmd)
            .args(args)
            .stdin(std::process::Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                Error::command_execution(
                    cmd,
                    args.to_vec(),
                    format!("failed to execute command: {e}"),
                    None,
                )
            })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Clone)]
    pub struct ScriptedResponse {
        pub stdout: Vec<u8>,
        pub stderr: Vec<u8>,
        pub status_code: i32,
    }

    /// A recorded invocation; `file://` arguments are captured with the file
    /// contents they pointed at when the command ran
    #[derive(Debug, Clone)]
    pub struct RecordedCall {
        pub cmd: String,
        pub args: Vec<String>,
        pub file_contents: Vec<String>,
    }

    /// Executor that answers from a table keyed by subcommand, e.g.
    /// `"secretsmanager get-secret-value"`
    pub struct ScriptedCommandExecutor {
        responses: Mutex<HashMap<String, ScriptedResponse>>,
        calls: Mutex<Vec<RecordedCall>>,
    }

    impl ScriptedCommandExecutor {
        pub fn new() -> Self {
            Self {
                responses: Mutex::new(HashMap::new()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn respond(&self, subcommand: &str, stdout: &str) {
            self.add(subcommand, stdout, "", 0);
        }

        pub fn fail(&self, subcommand: &str, stderr: &str, status_code: i32) {
            self.add(subcommand, "", stderr, status_code);
        }

        fn add(&self, subcommand: &str, stdout: &str, stderr: &str, status_code: i32) {
            self.responses.lock().unwrap().insert(
                subcommand.to_string(),
                ScriptedResponse {
                    stdout: stdout.as_bytes().to_vec(),
                    stderr: stderr.as_bytes().to_vec(),
                    status_code,
                },
            );
        }

        pub fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandExecutor for ScriptedCommandExecutor {
        async fn execute(&self, cmd: &str, args: &[String]) -> Result<Output> {
            let file_contents = args
                .iter()
                .filter_map(|a| a.strip_prefix("file://"))
                .map(|path| std::fs::read_to_string(path).unwrap_or_default())
                .collect();
            self.calls.lock().unwrap().push(RecordedCall {
                cmd: cmd.to_string(),
                args: args.to_vec(),
                file_contents,
            });

            let key = args.iter().take(2).cloned().collect::<Vec<_>>().join(" ");
            let responses = self.responses.lock().unwrap();
            match responses.get(&key) {
                Some(response) => Ok(Output {
                    status: exit_status::from_code(response.status_code),
                    stdout: response.stdout.clone(),
                    stderr: response.stderr.clone(),
                }),
                None => Err(Error::command_execution(
                    cmd,
                    args.to_vec(),
                    format!("no scripted response for '{key}'"),
                    None,
                )),
            }
        }
    }

    mod exit_status {
        #[cfg(unix)]
        pub fn from_code(code: i32) -> std::process::ExitStatus {
            use std::os::unix::process::ExitStatusExt;
            // Raw wait status keeps the exit code in the second byte
            std::process::ExitStatus::from_raw(code << 8)
        }

        #[cfg(windows)]
        pub fn from_code(code: i32) -> std::process::ExitStatus {
            use std::os::windows::process::ExitStatusExt;
            std::process::ExitStatus::from_raw(code as u32)
        }
    }
}
