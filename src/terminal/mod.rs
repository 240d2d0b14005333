//! Embedded pseudo-terminal
//!
//! Spawns `/bin/bash` on a pty and back-projects its output onto a
//! read-only buffer. The reader thread owns the parse loop: it blocks on
//! the master fd, applies each chunk to the buffer and color grid under
//! their locks, and signals the main thread through an event channel.
//! The main thread renders from the same buffer; stale reads are fine
//! because every reader signal triggers another redraw.

pub mod ansi;
pub mod destination;

use std::ffi::CString;
use std::os::fd::{AsRawFd, OwnedFd};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use anyhow::{anyhow, Context, Result};
use nix::pty::{openpty, Winsize};
use nix::sys::signal::{kill, Signal};
use nix::sys::termios::Termios;
use nix::unistd::{dup2, execve, fork, getuid, setsid, ForkResult, Pid, User};

use crate::buffer::{BufferHandle, BufferStatus, FileType};
use crate::key::Key;
use crate::point::Point;

pub use ansi::{AnsiParser, ColorRun, TermGrid, DEFAULT_COLOR};
pub use destination::{find_destination, Destination};

nix::ioctl_write_ptr_bad!(tiocswinsz, libc::TIOCSWINSZ, Winsize);
nix::ioctl_write_int_bad!(tiocsctty, libc::TIOCSCTTY);

/// Reader-thread signals to the main loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalEvent {
    /// New output was applied to the buffer; redraw when convenient
    Wakeup,
    /// The shell exited; one final redraw, then sends become no-ops
    ChildExit,
}

/// A live embedded terminal
pub struct Terminal {
    pub buffer: BufferHandle,
    grid: Arc<Mutex<TermGrid>>,
    master: Arc<OwnedFd>,
    pid: Pid,
    alive: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl Terminal {
    /// Allocate a pty, fork a shell onto the slave end, and start the
    /// reader thread against `buffer`
    pub fn spawn(
        width: i64,
        height: i64,
        buffer: BufferHandle,
    ) -> Result<(Terminal, Receiver<TerminalEvent>)> {
        let winsize = Winsize {
            ws_row: height as u16,
            ws_col: width as u16,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };

        let pty = openpty(Some(&winsize), None::<&Termios>).context("openpty failed")?;

        let pid = match unsafe { fork() }.context("fork failed")? {
            ForkResult::Child => exec_shell(pty.slave),
            ForkResult::Parent { child } => child,
        };
        drop(pty.slave);

        let cursor = {
            let mut buf = buffer
                .lock()
                .map_err(|_| anyhow!("terminal buffer poisoned"))?;
            if buf.lines.is_empty() {
                buf.alloc_lines(1);
            }
            buf.status = BufferStatus::ReadOnly;
            buf.file_type = FileType::Terminal;
            buf.no_line_numbers = true;

            let last_line = buf.line_count() - 1;
            Point::new(buf.line(last_line).map_or(0, |l| l.len() as i64), last_line)
        };

        let mut grid = TermGrid::new(width, height);
        grid.cursor = cursor;
        let grid = Arc::new(Mutex::new(grid));

        let master = Arc::new(pty.master);
        let alive = Arc::new(AtomicBool::new(true));
        let (sender, receiver) = mpsc::channel();

        let reader = spawn_reader(
            Arc::clone(&buffer),
            Arc::clone(&grid),
            Arc::clone(&master),
            Arc::clone(&alive),
            sender,
        );

        Ok((
            Terminal {
                buffer,
                grid,
                master,
                pid,
                alive,
                reader: Some(reader),
            },
            receiver,
        ))
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Update the pty window size; buffer contents are not reflowed
    pub fn resize(&self, width: i64, height: i64) -> bool {
        let winsize = Winsize {
            ws_row: height as u16,
            ws_col: width as u16,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };
        if unsafe { tiocswinsz(self.master.as_raw_fd(), &winsize) }.is_err() {
            return false;
        }

        if let Ok(mut grid) = self.grid.lock() {
            grid.width = width;
            grid.height = height;
        }
        true
    }

    /// Encode `key` and write it to the shell. No-op after child exit.
    pub fn send_key(&self, key: Key) -> bool {
        if !self.is_alive() {
            return false;
        }
        let bytes = key.to_vt100_bytes();
        if bytes.is_empty() {
            return false;
        }
        nix::unistd::write(&*self.master, &bytes).is_ok()
    }

    /// The shell's current working directory, via procfs
    pub fn current_directory(&self) -> Option<PathBuf> {
        std::fs::read_link(format!("/proc/{}/cwd", self.pid.as_raw())).ok()
    }

    pub fn cursor(&self) -> Point {
        self.grid.lock().map(|g| g.cursor).unwrap_or_default()
    }

    /// Run `f` against the color grid under its lock
    pub fn with_grid<R>(&self, f: impl FnOnce(&TermGrid) -> R) -> Option<R> {
        self.grid.lock().ok().map(|grid| f(&grid))
    }

    /// Signal the shell and join the reader thread
    pub fn shutdown(&mut self) {
        if self.alive.swap(false, Ordering::SeqCst) {
            let _ = kill(self.pid, Signal::SIGHUP);
        }
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn spawn_reader(
    buffer: BufferHandle,
    grid: Arc<Mutex<TermGrid>>,
    master: Arc<OwnedFd>,
    alive: Arc<AtomicBool>,
    sender: Sender<TerminalEvent>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let mut parser = AnsiParser::new();
        let mut bytes = [0u8; 8192];

        while alive.load(Ordering::SeqCst) {
            match nix::unistd::read(master.as_raw_fd(), &mut bytes) {
                Ok(0) | Err(_) => {
                    alive.store(false, Ordering::SeqCst);
                    let _ = sender.send(TerminalEvent::ChildExit);
                    break;
                }
                Ok(count) => {
                    // lock order: buffer first, then grid (matches render)
                    let Ok(mut buf) = buffer.lock() else { break };
                    let Ok(mut g) = grid.lock() else { break };
                    parser.process(&bytes[..count], &mut g, &mut buf);
                    drop(g);
                    drop(buf);

                    let _ = sender.send(TerminalEvent::Wakeup);
                }
            }
        }
    })
}

/// Child half of the fork: session leader, stdio onto the slave end,
/// scrubbed environment, then exec the shell
fn exec_shell(slave: OwnedFd) -> ! {
    let _ = setsid();

    let raw = slave.as_raw_fd();
    let _ = dup2(raw, 0);
    let _ = dup2(raw, 1);
    let _ = dup2(raw, 2);
    let _ = unsafe { tiocsctty(raw, 0) };

    let (login, home) = match User::from_uid(getuid()) {
        Ok(Some(user)) => (user.name, user.dir.display().to_string()),
        _ => ("unknown".to_string(), "/".to_string()),
    };

    let shell = "/bin/bash";
    let env: Vec<CString> = [
        format!("LOGNAME={login}"),
        format!("USER={login}"),
        format!("SHELL={shell}"),
        format!("HOME={home}"),
        "TERM=rxvt".to_string(),
    ]
    .into_iter()
    .filter_map(|pair| CString::new(pair).ok())
    .collect();

    if let Ok(path) = CString::new(shell) {
        let args = [path.clone()];
        let _ = execve(&path, &args, &env);
    }

    std::process::exit(1);
}
