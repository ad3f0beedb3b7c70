//! Classic double-step daemonization: fork, new session, chdir to `/`,
//! stdio onto `/dev/null`. Must run before the async runtime starts so no
//! runtime threads exist at fork time.

use std::io;

/// Detaches the process into the background. The parent exits 0; the
/// child continues as the session leader with stdio redirected.
pub fn daemonize() -> io::Result<()> {
    // SAFETY: single-threaded at this point; fork/setsid/chdir/dup2 are
    // async-signal-safe libc calls with no Rust state shared across the
    // fork boundary.
    unsafe {
        match libc::fork() {
            -1 => return Err(io::Error::last_os_error()),
            0 => {}
            _ => std::process::exit(exitcode::OK),
        }

        if libc::setsid() == -1 {
            return Err(io::Error::last_os_error());
        }
        if libc::chdir(c"/".as_ptr()) == -1 {
            return Err(io::Error::last_os_error());
        }

        let devnull = libc::open(c"/dev/null".as_ptr(), libc::O_RDWR);
        if devnull == -1 {
            return Err(io::Error::last_os_error());
        }
        for fd in [libc::STDIN_FILENO, libc::STDOUT_FILENO, libc::STDERR_FILENO] {
            if libc::dup2(devnull, fd) == -1 {
                return Err(io::Error::last_os_error());
            }
        }
        if devnull > libc::STDERR_FILENO {
            libc::close(devnull);
        }
    }
    Ok(())
}
