//! The "draw a colored point" primitive and its implementations.

use std::io::{self, Write};

use super::planner::RenderTask;
use crate::util::color::Rgba;

/// Receiver of emitted points in world coordinates.
///
/// `x` is the display column and `y` the display row.
pub trait PointSink {
    /// Called once before the points of a non-empty task are emitted.
    fn begin_task(&mut self, _task: &RenderTask) {}

    fn emit_point(&mut self, x: f32, y: f32, color: Rgba);
}

/// One emitted point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    pub color: Rgba,
}

/// Collects points into memory.
#[derive(Clone, Debug, Default)]
pub struct PointBuffer {
    pub points: Vec<Point>,
}

impl PointBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

impl PointSink for PointBuffer {
    fn emit_point(&mut self, x: f32, y: f32, color: Rgba) {
        self.points.push(Point { x, y, color });
    }
}

// =============================================================================
// SVG Export
// =============================================================================

/// Writes emitted points as unit squares of an SVG document.
///
/// Write errors are latched: after the first failure further points are
/// dropped and the error is returned from [`SvgWriter::finish`].
pub struct SvgWriter<W: Write> {
    out: W,
    error: Option<io::Error>,
    written: usize,
}

impl<W: Write> SvgWriter<W> {
    /// Start a document covering the world rectangle `[x1, x2] x [y1, y2]`.
    pub fn new(mut out: W, extents: (f32, f32, f32, f32), background: Rgba) -> io::Result<Self> {
        let (x1, y1, x2, y2) = extents;
        let (w, h) = (x2 - x1, y2 - y1);
        writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{x1} {y1} {w} {h}" shape-rendering="crispEdges">"#
        )?;
        writeln!(
            out,
            r#"<rect x="{x1}" y="{y1}" width="{w}" height="{h}" fill="{}"/>"#,
            background.to_hex()
        )?;
        Ok(Self {
            out,
            error: None,
            written: 0,
        })
    }

    pub fn written(&self) -> usize {
        self.written
    }

    /// Close the document and return the sink.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        writeln!(self.out, "</svg>")?;
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> PointSink for SvgWriter<W> {
    fn emit_point(&mut self, x: f32, y: f32, color: Rgba) {
        if self.error.is_some() {
            return;
        }
        let result = writeln!(
            self.out,
            r#"<rect x="{}" y="{}" width="1" height="1" fill="{}" fill-opacity="{:.3}"/>"#,
            x - 0.5,
            y - 0.5,
            color.to_hex(),
            color.a
        );
        match result {
            Ok(()) => self.written += 1,
            Err(e) => self.error = Some(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_buffer() {
        let mut buf = PointBuffer::new();
        buf.emit_point(1.0, 2.0, Rgba::new(1.0, 0.0, 0.0, 0.5));
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.points[0].y, 2.0);
        buf.clear();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_svg_document() {
        let mut svg =
            SvgWriter::new(Vec::new(), (-0.5, -0.5, 2.5, 2.5), Rgba::opaque([0.0; 3])).unwrap();
        svg.emit_point(0.0, 1.0, Rgba::new(1.0, 1.0, 0.0, 0.5));
        svg.emit_point(2.0, 2.0, Rgba::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(svg.written(), 2);

        let text = String::from_utf8(svg.finish().unwrap()).unwrap();
        assert!(text.contains(r#"viewBox="-0.5 -0.5 3 3""#));
        assert!(text.contains(r##"<rect x="-0.5" y="0.5" width="1" height="1" fill="#ffff00" fill-opacity="0.500"/>"##));
        assert_eq!(text.matches("<rect").count(), 3);
        assert!(text.trim_end().ends_with("</svg>"));
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_svg_write_error_is_reported() {
        assert!(SvgWriter::new(FailingWriter, (0.0, 0.0, 1.0, 1.0), Rgba::opaque([1.0; 3])).is_err());
    }
}
