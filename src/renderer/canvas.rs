//! Canvas2D backend

use std::f64::consts::TAU;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::shapes::{BACKGROUND, Shape, build_scene, css_color};
use crate::sim::Simulation;

pub struct CanvasRenderer {
    ctx: CanvasRenderingContext2d,
    width: f64,
    height: f64,
}

impl CanvasRenderer {
    /// Size the canvas to the logical frame and grab its 2D context
    pub fn new(canvas: &HtmlCanvasElement, width: u32, height: u32) -> Result<Self, JsValue> {
        canvas.set_width(width);
        canvas.set_height(height);
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;

        Ok(Self {
            ctx,
            width: f64::from(width),
            height: f64::from(height),
        })
    }

    pub fn render(&self, sim: &Simulation) {
        let ctx = &self.ctx;
        ctx.set_global_alpha(1.0);
        ctx.set_fill_style_str(&css_color(BACKGROUND));
        ctx.fill_rect(0.0, 0.0, self.width, self.height);

        for shape in build_scene(sim) {
            self.draw(&shape);
        }
    }

    fn draw(&self, shape: &Shape) {
        let ctx = &self.ctx;
        match shape {
            Shape::Segment {
                from,
                to,
                width,
                color,
            } => {
                ctx.set_stroke_style_str(&css_color(*color));
                ctx.set_line_width(f64::from(*width));
                ctx.begin_path();
                ctx.move_to(f64::from(from.x), f64::from(from.y));
                ctx.line_to(f64::from(to.x), f64::from(to.y));
                ctx.stroke();
            }
            Shape::Rect { min, size, color } => {
                ctx.set_fill_style_str(&css_color(*color));
                ctx.fill_rect(
                    f64::from(min.x),
                    f64::from(min.y),
                    f64::from(size.x),
                    f64::from(size.y),
                );
            }
            Shape::Circle {
                center,
                radius,
                color,
                filled,
            } => {
                let style = css_color(*color);
                ctx.begin_path();
                if ctx
                    .arc(f64::from(center.x), f64::from(center.y), f64::from(*radius), 0.0, TAU)
                    .is_err()
                {
                    return;
                }
                if *filled {
                    ctx.set_fill_style_str(&style);
                    ctx.fill();
                } else {
                    ctx.set_stroke_style_str(&style);
                    ctx.set_line_width(2.0);
                    ctx.stroke();
                }
            }
        }
    }
}
