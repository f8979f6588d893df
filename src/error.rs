// A tiny error type so we don't rely on anyhow/thiserror.
// Every variant states *where* things went wrong.
use std::fmt::{self, Display};

#[derive(Debug)]
pub enum Error {
    WindowInit(String),       // Creating the window failed
    WindowUpdate(String),     // Updating the window buffer failed
    CameraInit(String),       // Opening/starting the camera failed
    CameraFrame(String),      // Grabbing/decoding a frame failed
    FileNotFound(String),     // Load path does not exist
    DecodeFailed(String),     // Image file could not be decoded
    WriteFailed(String),      // Image file could not be written
    InvalidParameter(String), // Detection parameter out of range
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::WindowInit(s) => write!(f, "Window init error: {s}"),
            Error::WindowUpdate(s) => write!(f, "Window update error: {s}"),
            Error::CameraInit(s) => write!(f, "Camera init error: {s}"),
            Error::CameraFrame(s) => write!(f, "Camera frame error: {s}"),
            Error::FileNotFound(s) => write!(f, "File not found: {s}"),
            Error::DecodeFailed(s) => write!(f, "Decode error: {s}"),
            Error::WriteFailed(s) => write!(f, "Write error: {s}"),
            Error::InvalidParameter(s) => write!(f, "Invalid parameter: {s}"),
        }
    }
}
