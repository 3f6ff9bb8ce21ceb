use std::{
    io::{self, PipeReader},
    os::unix::process::{CommandExt, ExitStatusExt},
    process::{Child, Command, ExitStatus, Stdio},
};

use crate::models::task::{ExitReason, TaskSpec};

/// Spawns the task in its own process group with stdout and stderr merged
/// into one pipe.
pub fn spawn(spec: &TaskSpec) -> io::Result<(Child, PipeReader)> {
    let (reader, writer) = io::pipe()?;

    let mut command = Command::new(&spec.program);
    command
        .args(&spec.args)
        .stdin(Stdio::null())
        .stdout(writer.try_clone()?)
        .stderr(writer)
        .process_group(0);
    if let Some(dir) = &spec.cwd {
        command.current_dir(dir);
    }

    let child = command.spawn()?;
    // the command still owns both write ends; the reader sees EOF only after they close
    drop(command);
    Ok((child, reader))
}

/// Sends `signal` to the process group led by `pid`.
pub fn signal_group(pid: u32, signal: libc::c_int) -> bool {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    unsafe { libc::kill(-pid, signal) == 0 }
}

pub fn terminate(pid: u32) -> bool {
    signal_group(pid, libc::SIGTERM)
}

pub fn kill(pid: u32) -> bool {
    signal_group(pid, libc::SIGKILL)
}

/// `None` for a successful exit.
pub fn exit_reason(status: ExitStatus) -> Option<ExitReason> {
    if status.success() {
        return None;
    }
    match (status.code(), status.signal()) {
        (Some(code), _) => Some(ExitReason::Code(code)),
        (None, Some(signal)) => Some(ExitReason::Signal(signal)),
        (None, None) => Some(ExitReason::Code(-1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_exit_statuses() {
        assert_eq!(exit_reason(ExitStatus::from_raw(0)), None);
        // wait status encodes the exit code in the high byte
        assert_eq!(
            exit_reason(ExitStatus::from_raw(3 << 8)),
            Some(ExitReason::Code(3))
        );
        assert_eq!(
            exit_reason(ExitStatus::from_raw(libc::SIGKILL)),
            Some(ExitReason::Signal(libc::SIGKILL))
        );
    }

    #[test]
    fn spawn_failure_is_reported() {
        let spec = TaskSpec::new("/definitely/not/a/program", Vec::new());
        assert!(spawn(&spec).is_err());
    }

    #[test]
    fn merges_stdout_and_stderr() {
        use std::io::Read;

        let spec = TaskSpec::shell("echo out; echo err >&2");
        let (mut child, mut reader) = spawn(&spec).expect("spawn sh");
        let mut text = String::new();
        reader.read_to_string(&mut text).expect("read pipe");
        let status = child.wait().expect("wait");
        assert!(status.success());
        assert_eq!(text, "out\nerr\n");
    }
}
