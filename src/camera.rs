// Opens the default camera and converts frames into the session's pixel
// layout. `next_frame()` yields a FrameBuffer of 0x00RRGGBB pixels at
// whatever resolution the device actually delivers; the frame store brings
// it to 320x240.

use crate::error::Error;
use crate::types::{FrameBuffer, pack_rgb};

use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    utils::{
        CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
    },
};

// A small wrapper around nokhwa::Camera so the main loop stays clean.
pub struct CameraCapture {
    cam: Camera,
    width: u32,
    height: u32,
}

impl CameraCapture {
    /// Open the camera at `index`, asking for a format close to the
    /// requested resolution (the device may pick a neighbor).
    pub fn new(index: u32, width: u32, height: u32) -> Result<Self, Error> {
        let idx = CameraIndex::Index(index);

        let fmt = CameraFormat::new(
            Resolution::new(width, height),
            FrameFormat::YUYV, // uncompressed; cheap to convert to RGB
            30,
        );
        let req = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(fmt));

        let mut cam =
            Camera::new(idx, req).map_err(|e| Error::CameraInit(format!("Create camera: {e}")))?;

        cam.open_stream()
            .map_err(|e| Error::CameraInit(format!("Open stream: {e}")))?;

        let actual = cam.resolution();
        Ok(Self { cam, width: actual.width(), height: actual.height() })
    }

    /// Grab one frame and pack it as 0x00RRGGBB pixels. Blocks until the
    /// device has a frame ready.
    pub fn next_frame(&mut self) -> Result<FrameBuffer, Error> {
        let frame = self
            .cam
            .frame()
            .map_err(|e| Error::CameraFrame(format!("Fetch frame: {e}")))?;

        let rgb_img = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| Error::CameraFrame(format!("Decode RGB: {e}")))?;

        let (w, h) = rgb_img.dimensions();
        let mut out = FrameBuffer::new(w as usize, h as usize);
        for (dst, px) in out.pixels.iter_mut().zip(rgb_img.as_raw().chunks_exact(3)) {
            *dst = pack_rgb(px[0], px[1], px[2]);
        }
        Ok(out)
    }

    /// The resolution the camera is actually delivering.
    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
