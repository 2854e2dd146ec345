//! # Frame Buffer and Pixel Sinks
//!
//! A [`Frame`] is the canvas one render pass draws into. It is owned by that
//! pass alone and handed to a [`PixelSink`] in a single `present` call, so the
//! matrix only ever shows complete frames.
//!
//! The LED matrix driver itself lives outside this crate; anything that can
//! show a rows×cols RGB buffer implements [`PixelSink`]. Two sinks ship here:
//! [`TerminalSink`] for development without hardware, and [`MemorySink`] for
//! tests and dry runs.

use crate::error::SinkError;
use embedded_graphics::{pixelcolor::Rgb888, prelude::*, primitives::Rectangle};
use std::convert::Infallible;
use std::io::Write;

/// Owned RGB pixel buffer, row-major, black when created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<Rgb888>,
}

impl Frame {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgb888::BLACK; width as usize * height as usize],
        }
    }

    /// Set every pixel to black.
    pub fn clear(&mut self) {
        self.pixels.fill(Rgb888::BLACK);
    }

    /// Set one pixel; coordinates outside the frame are ignored.
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Rgb888) {
        if let Some(index) = self.index(x, y) {
            self.pixels[index] = color;
        }
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgb888> {
        self.index(x, y).map(|index| self.pixels[index])
    }

    /// Pixels in `area` that are not black.
    pub fn lit_in(&self, area: &Rectangle) -> usize {
        area.points()
            .filter_map(|p| self.pixel(p.x, p.y))
            .filter(|&c| c != Rgb888::BLACK)
            .count()
    }

    /// Pixels anywhere in the frame that are not black.
    pub fn lit_pixels(&self) -> usize {
        self.pixels.iter().filter(|&&c| c != Rgb888::BLACK).count()
    }

    /// Pixels in `area` of exactly `color`.
    pub fn count_color_in(&self, area: &Rectangle, color: Rgb888) -> usize {
        area.points()
            .filter_map(|p| self.pixel(p.x, p.y))
            .filter(|&c| c == color)
            .count()
    }

    /// Rows of pixels, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Rgb888]> {
        self.pixels.chunks(self.width.max(1) as usize)
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let (x, y) = (u32::try_from(x).ok()?, u32::try_from(y).ok()?);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }
}

impl OriginDimensions for Frame {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Frame {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set_pixel(point.x, point.y, color);
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.pixels.fill(color);
        Ok(())
    }
}

/// Something that can show a finished frame.
pub trait PixelSink {
    /// Canvas size the sink expects.
    fn size(&self) -> Size;

    /// A blank frame of the right size.
    fn create_frame(&self) -> Frame {
        let size = self.size();
        Frame::new(size.width, size.height)
    }

    /// Show `frame`, replacing whatever was shown before.
    fn present(&mut self, frame: Frame) -> Result<(), SinkError>;

    /// Blank the display.
    fn clear(&mut self) -> Result<(), SinkError>;
}

fn check_size(expected: Size, frame: &Frame) -> Result<(), SinkError> {
    let got = frame.size();
    if got != expected {
        return Err(SinkError::SizeMismatch {
            expected: (expected.width, expected.height),
            got: (got.width, got.height),
        });
    }
    Ok(())
}

/// Prints frames to a terminal, one character per pixel.
///
/// With `color` on, lit pixels are drawn with 24-bit ANSI colour; otherwise
/// they show as `#` on a blank background.
pub struct TerminalSink<W: Write> {
    out: W,
    size: Size,
    color: bool,
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W, size: Size, color: bool) -> Self {
        Self { out, size, color }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_frame(&mut self, frame: &Frame) -> Result<(), SinkError> {
        let border = format!("+{}+", "-".repeat(self.size.width as usize));
        writeln!(self.out, "{border}")?;
        for row in frame.rows() {
            let mut line = String::with_capacity(row.len() * 4 + 2);
            line.push('|');
            for &pixel in row {
                if pixel == Rgb888::BLACK {
                    line.push(' ');
                } else if self.color {
                    line.push_str(&format!(
                        "\x1b[38;2;{};{};{}m█\x1b[0m",
                        pixel.r(),
                        pixel.g(),
                        pixel.b()
                    ));
                } else {
                    line.push('#');
                }
            }
            line.push('|');
            writeln!(self.out, "{line}")?;
        }
        writeln!(self.out, "{border}")?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> PixelSink for TerminalSink<W> {
    fn size(&self) -> Size {
        self.size
    }

    fn present(&mut self, frame: Frame) -> Result<(), SinkError> {
        check_size(self.size, &frame)?;
        self.write_frame(&frame)
    }

    fn clear(&mut self) -> Result<(), SinkError> {
        let blank = self.create_frame();
        self.write_frame(&blank)
    }
}

/// Keeps the most recent frame in memory.
#[derive(Debug)]
pub struct MemorySink {
    size: Size,
    current: Frame,
    presented: usize,
    cleared: usize,
}

impl MemorySink {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            current: Frame::new(size.width, size.height),
            presented: 0,
            cleared: 0,
        }
    }

    /// What the display is showing right now.
    pub fn current(&self) -> &Frame {
        &self.current
    }

    pub fn presented(&self) -> usize {
        self.presented
    }

    pub fn cleared(&self) -> usize {
        self.cleared
    }
}

impl PixelSink for MemorySink {
    fn size(&self) -> Size {
        self.size
    }

    fn present(&mut self, frame: Frame) -> Result<(), SinkError> {
        check_size(self.size, &frame)?;
        self.current = frame;
        self.presented += 1;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), SinkError> {
        self.current.clear();
        self.cleared += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};

    #[test]
    fn test_frame_starts_black_and_clips() {
        let mut frame = Frame::new(64, 32);
        assert_eq!(frame.lit_pixels(), 0);

        frame.set_pixel(-1, 0, Rgb888::RED);
        frame.set_pixel(64, 0, Rgb888::RED);
        frame.set_pixel(0, 32, Rgb888::RED);
        assert_eq!(frame.lit_pixels(), 0);

        frame.set_pixel(63, 31, Rgb888::RED);
        assert_eq!(frame.pixel(63, 31), Some(Rgb888::RED));
        assert_eq!(frame.lit_pixels(), 1);
    }

    #[test]
    fn test_frame_is_a_draw_target() {
        let mut frame = Frame::new(64, 32);
        Rectangle::new(Point::new(60, 30), Size::new(10, 10))
            .into_styled(PrimitiveStyle::with_fill(Rgb888::BLUE))
            .draw(&mut frame)
            .unwrap();

        // Only the on-canvas 4x2 corner lands
        assert_eq!(frame.lit_pixels(), 8);
        let corner = Rectangle::new(Point::new(60, 30), Size::new(4, 2));
        assert_eq!(frame.count_color_in(&corner, Rgb888::BLUE), 8);

        frame.clear();
        assert_eq!(frame.lit_pixels(), 0);
    }

    #[test]
    fn test_memory_sink_swaps_whole_frames() {
        let mut sink = MemorySink::new(Size::new(64, 32));
        let mut frame = sink.create_frame();
        frame.set_pixel(1, 1, Rgb888::WHITE);
        sink.present(frame).unwrap();
        assert_eq!(sink.current().lit_pixels(), 1);

        sink.present(sink.create_frame()).unwrap();
        assert_eq!(sink.current().lit_pixels(), 0);
        assert_eq!(sink.presented(), 2);

        sink.clear().unwrap();
        assert_eq!(sink.cleared(), 1);
    }

    #[test]
    fn test_sink_rejects_wrong_size() {
        let mut sink = MemorySink::new(Size::new(64, 32));
        let err = sink.present(Frame::new(32, 16)).unwrap_err();
        assert!(matches!(err, SinkError::SizeMismatch { .. }));
        assert_eq!(sink.presented(), 0);
    }

    #[test]
    fn test_terminal_sink_prints_grid() {
        let mut sink = TerminalSink::new(Vec::new(), Size::new(4, 2), false);
        let mut frame = sink.create_frame();
        frame.set_pixel(0, 0, Rgb888::YELLOW);
        frame.set_pixel(3, 1, Rgb888::WHITE);
        sink.present(frame).unwrap();

        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines, vec!["+----+", "|#   |", "|   #|", "+----+"]);
    }
}
