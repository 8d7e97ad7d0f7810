//! Serial device opening and raw-mode configuration (8N1, no echo, no
//! signals) for the TNC, GPS and telemetry descriptors.

use std::fs;
use std::io;

use nix::sys::termios::{
    self, BaudRate, ControlFlags, InputFlags, LocalFlags, OutputFlags, SetArg,
};

/// Open `device` read/write and put it in raw mode at `baud`.
pub fn open_serial(device: &str, baud: u32) -> io::Result<fs::File> {
    let file = fs::OpenOptions::new().read(true).write(true).open(device)?;
    configure_serial(&file, baud)?;
    Ok(file)
}

fn configure_serial(file: &fs::File, baud: u32) -> io::Result<()> {
    let mut t = termios::tcgetattr(file).map_err(nix_err)?;

    t.local_flags &= !(LocalFlags::ICANON | LocalFlags::ECHO | LocalFlags::ECHOE | LocalFlags::ISIG);
    t.output_flags &= !OutputFlags::OPOST;
    t.input_flags &= !(InputFlags::IXON
        | InputFlags::IXOFF
        | InputFlags::IXANY
        | InputFlags::ISTRIP
        | InputFlags::INPCK);
    t.control_flags |= ControlFlags::CS8 | ControlFlags::CREAD | ControlFlags::CLOCAL;
    t.control_flags &= !(ControlFlags::CSIZE | ControlFlags::CSTOPB | ControlFlags::PARENB);

    t.control_chars[nix::sys::termios::SpecialCharacterIndices::VMIN as usize] = 1;
    t.control_chars[nix::sys::termios::SpecialCharacterIndices::VTIME as usize] = 0;

    let baud_rate = baud_rate_of(baud);
    termios::cfsetospeed(&mut t, baud_rate).map_err(nix_err)?;
    termios::cfsetispeed(&mut t, baud_rate).map_err(nix_err)?;
    termios::tcsetattr(file, SetArg::TCSANOW, &t).map_err(nix_err)?;

    Ok(())
}

fn baud_rate_of(baud: u32) -> BaudRate {
    match baud {
        1200 => BaudRate::B1200,
        2400 => BaudRate::B2400,
        4800 => BaudRate::B4800,
        9600 => BaudRate::B9600,
        19200 => BaudRate::B19200,
        38400 => BaudRate::B38400,
        57600 => BaudRate::B57600,
        115200 => BaudRate::B115200,
        _ => BaudRate::B9600,
    }
}

fn nix_err(e: nix::Error) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e.to_string())
}
