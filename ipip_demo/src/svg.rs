// Copyright 2025 the ipip Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Minimal SVG dump of rendered dashboard frames.

use std::fmt::Write as _;

use ipip_core::{DrawIndex, DrawList};
use ipip_dashboard::FrameOutput;
use kurbo::Rect;
use peniko::Color;

const LINE_WIDTH: f64 = 1.5;
const TITLE_SIZE: f64 = 14.0;

/// Figures stacked top to bottom, one SVG group each.
#[derive(Debug, Default)]
pub(crate) struct SvgScene {
    body: String,
    view_box: Option<Rect>,
}

impl SvgScene {
    /// Appends one figure, shifted down by `offset_y`.
    pub(crate) fn push_frame(&mut self, frame: &FrameOutput, offset_y: f64) {
        let plot = frame.viewport.rect;
        let out = &mut self.body;
        let _ = writeln!(out, r#"<g transform="translate(0 {offset_y})">"#);
        let _ = writeln!(
            out,
            r#"<text x="{}" y="{}" font-size="{TITLE_SIZE}">{}</text>"#,
            plot.x0,
            plot.y0 - 6.0,
            escape_xml(&frame.figure)
        );
        let _ = writeln!(
            out,
            r##"<rect x="{}" y="{}" width="{}" height="{}" fill="#ffffff" stroke="#888888"/>"##,
            plot.x0,
            plot.y0,
            plot.width(),
            plot.height()
        );

        write_triangles(out, &frame.geometry);
        for line in &frame.lines {
            let (stroke, opacity) = svg_color(line.color);
            let _ = write!(
                out,
                r#"<path d="{}" fill="none" stroke="{stroke}" stroke-width="{LINE_WIDTH}""#,
                line.path.to_svg()
            );
            write_opacity(out, "stroke", opacity);
            out.push_str("/>\n");
        }
        let style = &frame.label_style;
        let family = escape_xml(style.font_family.as_css_family());
        for label in &frame.labels {
            let (fill, opacity) = svg_color(label.color);
            let _ = write!(
                out,
                r#"<text x="{}" y="{}" font-family="{family}" font-size="{}" dominant-baseline="hanging" fill="{fill}""#,
                label.origin.x, label.origin.y, style.font_size
            );
            write_opacity(out, "fill", opacity);
            let _ = writeln!(out, ">{}</text>", escape_xml(&label.text));
        }
        out.push_str("</g>\n");

        let placed = Rect::new(
            plot.x0,
            plot.y0 + offset_y - TITLE_SIZE - 6.0,
            plot.x1,
            plot.y1 + offset_y,
        );
        self.view_box = Some(match self.view_box {
            Some(r) => r.union(placed),
            None => placed,
        });
    }

    pub(crate) fn to_svg_string(&self) -> String {
        let view_box = self
            .view_box
            .unwrap_or_else(|| Rect::new(0.0, 0.0, 100.0, 100.0))
            .inflate(10.0, 10.0);
        let mut out = String::new();
        out.push_str(r#"<svg xmlns="http://www.w3.org/2000/svg" "#);
        let _ = writeln!(
            out,
            r#"viewBox="{} {} {} {}" width="{}" height="{}" preserveAspectRatio="xMinYMin meet">"#,
            view_box.x0,
            view_box.y0,
            view_box.width(),
            view_box.height(),
            view_box.width(),
            view_box.height()
        );
        out.push_str(&self.body);
        out.push_str("</svg>\n");
        out
    }
}

/// One `<path>` per indexed triangle, colored by its first vertex.
fn write_triangles<I: DrawIndex>(out: &mut String, list: &DrawList<I>) {
    for batch in list.batches() {
        let vertices = list.batch_vertices(batch);
        for tri in list.batch_indices(batch).chunks_exact(3) {
            let corner = |k: usize| {
                usize::try_from(tri[k].to_u32())
                    .ok()
                    .and_then(|i| vertices.get(i))
            };
            let (Some(a), Some(b), Some(c)) = (corner(0), corner(1), corner(2)) else {
                log::warn!("triangle index out of range in batch {batch:?}");
                continue;
            };
            let [r, g, bl, alpha] = a.color;
            let _ = write!(
                out,
                r##"<path d="M{} {}L{} {}L{} {}Z" fill="#{r:02x}{g:02x}{bl:02x}""##,
                a.pos[0], a.pos[1], b.pos[0], b.pos[1], c.pos[0], c.pos[1]
            );
            if alpha != 255 {
                let _ = write!(out, r#" fill-opacity="{}""#, f64::from(alpha) / 255.0);
            }
            out.push_str("/>\n");
        }
    }
}

fn svg_color(color: Color) -> (String, Option<f64>) {
    let rgba = color.to_rgba8();
    let value = format!("#{:02x}{:02x}{:02x}", rgba.r, rgba.g, rgba.b);
    let opacity = if rgba.a == 255 {
        None
    } else {
        Some(f64::from(rgba.a) / 255.0)
    };
    (value, opacity)
}

fn write_opacity(out: &mut String, name: &str, opacity: Option<f64>) {
    if let Some(o) = opacity {
        let _ = write!(out, r#" {name}-opacity="{o}""#);
    }
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
