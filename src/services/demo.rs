//! Procedural exercise demos shown when no genuine footage is available.

use std::f64::consts::TAU;
use std::fmt::Write;

use serde::Serialize;

pub const CANVAS_WIDTH: f64 = 320.0;
pub const CANVAS_HEIGHT: f64 = 240.0;

const FLOOR_INSET: f64 = 50.0;
const SKIN: &str = "#fbbf24";
const IRON: &str = "#6b7280";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DemoKind {
    Squat,
    CurtsyLunge,
    Pulse,
}

impl DemoKind {
    pub fn select(video_id: &str, title: Option<&str>) -> Self {
        match video_id {
            "450" => DemoKind::Squat,
            "451" => DemoKind::CurtsyLunge,
            _ => {
                let title = title.unwrap_or_default().to_ascii_lowercase();
                if title.contains("squat") {
                    DemoKind::Squat
                } else if title.contains("lunge") {
                    DemoKind::CurtsyLunge
                } else {
                    DemoKind::Pulse
                }
            }
        }
    }

    /// Movement repetitions per loop.
    fn reps(self) -> f64 {
        match self {
            DemoKind::Squat => 2.0,
            DemoKind::CurtsyLunge => 1.0,
            DemoKind::Pulse => 2.0,
        }
    }
}

/// Background colours for the pulse demo, chosen by category.
fn pulse_palette(category: Option<&str>) -> (&'static str, &'static str) {
    match category.map(|c| c.to_ascii_lowercase()).as_deref() {
        Some("strength") => ("#1e40af", "#1e3a8a"),
        Some("cardio") => ("#dc2626", "#991b1b"),
        Some("mobility") | Some("flexibility") => ("#7c3aed", "#5b21b6"),
        _ => ("#059669", "#047857"),
    }
}

/// A looping demo animation. The frame counter wraps at `period`, and the
/// loop only advances while `playing` is set.
#[derive(Debug, Clone)]
pub struct DemoLoop {
    kind: DemoKind,
    title: String,
    category: Option<String>,
    period: u32,
    frame: u32,
    playing: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DemoStatus {
    pub kind: DemoKind,
    pub frame: u32,
    pub period: u32,
    pub progress: f64,
    pub playing: bool,
}

impl DemoLoop {
    pub fn new(kind: DemoKind, title: impl Into<String>, category: Option<String>, period: u32) -> Self {
        Self {
            kind,
            title: title.into(),
            category,
            period: period.max(1),
            frame: 0,
            playing: true,
        }
    }

    pub fn kind(&self) -> DemoKind {
        self.kind
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Advances one frame if playing and returns the current frame.
    pub fn tick(&mut self) -> u32 {
        if self.playing {
            self.frame = (self.frame + 1) % self.period;
        }
        self.frame
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn resume(&mut self) {
        self.playing = true;
    }

    pub fn reset(&mut self) {
        self.frame = 0;
        self.playing = true;
    }

    /// Progress through the loop in percent.
    pub fn progress(&self) -> f64 {
        f64::from(self.frame) / f64::from(self.period) * 100.0
    }

    pub fn status(&self) -> DemoStatus {
        DemoStatus {
            kind: self.kind,
            frame: self.frame,
            period: self.period,
            progress: self.progress(),
            playing: self.playing,
        }
    }

    pub fn render(&self) -> DemoFrame {
        let phase = f64::from(self.frame) / f64::from(self.period) * TAU * self.kind.reps();
        match self.kind {
            DemoKind::Squat => squat_frame(phase, &self.title),
            DemoKind::CurtsyLunge => lunge_frame(phase, &self.title),
            DemoKind::Pulse => pulse_frame(phase, &self.title, self.category.as_deref()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
        fill: Option<&'static str>,
        stroke: Option<&'static str>,
        opacity: f64,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        stroke: &'static str,
        width: f64,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: &'static str,
    },
    Text {
        x: f64,
        y: f64,
        text: String,
        size: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gradient {
    Linear,
    Radial,
}

/// One rendered frame of a demo.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoFrame {
    pub gradient: Gradient,
    pub colors: (&'static str, &'static str),
    pub shapes: Vec<Shape>,
}

impl DemoFrame {
    pub fn to_svg(&self) -> String {
        let mut svg = String::new();
        let _ = write!(
            svg,
            r#"<svg width="{w}" height="{h}" viewBox="0 0 {w} {h}" xmlns="http://www.w3.org/2000/svg"><defs>"#,
            w = CANVAS_WIDTH,
            h = CANVAS_HEIGHT
        );
        let (from, to) = self.colors;
        match self.gradient {
            Gradient::Linear => {
                let _ = write!(
                    svg,
                    r#"<linearGradient id="bg" x1="0%" y1="0%" x2="100%" y2="100%"><stop offset="0%" stop-color="{}"/><stop offset="100%" stop-color="{}"/></linearGradient>"#,
                    from, to
                );
            }
            Gradient::Radial => {
                let _ = write!(
                    svg,
                    r#"<radialGradient id="bg"><stop offset="0%" stop-color="{}"/><stop offset="100%" stop-color="{}"/></radialGradient>"#,
                    from, to
                );
            }
        }
        svg.push_str(r#"</defs><rect width="100%" height="100%" fill="url(#bg)"/>"#);

        for shape in &self.shapes {
            match shape {
                Shape::Circle {
                    cx,
                    cy,
                    r,
                    fill,
                    stroke,
                    opacity,
                } => {
                    let _ = write!(
                        svg,
                        r#"<circle cx="{:.1}" cy="{:.1}" r="{:.1}" fill="{}" stroke="{}" stroke-width="2" opacity="{:.2}"/>"#,
                        cx,
                        cy,
                        r,
                        fill.unwrap_or("none"),
                        stroke.unwrap_or("none"),
                        opacity
                    );
                }
                Shape::Line {
                    x1,
                    y1,
                    x2,
                    y2,
                    stroke,
                    width,
                } => {
                    let _ = write!(
                        svg,
                        r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{}" stroke-width="{}" stroke-linecap="round"/>"#,
                        x1, y1, x2, y2, stroke, width
                    );
                }
                Shape::Rect {
                    x,
                    y,
                    width,
                    height,
                    fill,
                } => {
                    let _ = write!(
                        svg,
                        r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}"/>"#,
                        x, y, width, height, fill
                    );
                }
                Shape::Text { x, y, text, size } => {
                    let _ = write!(
                        svg,
                        r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" fill="white" font-family="Arial" font-size="{}" font-weight="bold">{}</text>"#,
                        x,
                        y,
                        size,
                        escape_xml(text)
                    );
                }
            }
        }

        svg.push_str("</svg>");
        svg
    }
}

fn floor() -> Shape {
    Shape::Line {
        x1: FLOOR_INSET,
        y1: CANVAS_HEIGHT - FLOOR_INSET,
        x2: CANVAS_WIDTH - FLOOR_INSET,
        y2: CANVAS_HEIGHT - FLOOR_INSET,
        stroke: "white",
        width: 3.0,
    }
}

fn title(text: &str) -> Shape {
    Shape::Text {
        x: CANVAS_WIDTH / 2.0,
        y: 30.0,
        text: text.to_string(),
        size: 16,
    }
}

/// Head, torso and a dumbbell bar held at chest height.
fn upper_body(x: f64, y: f64, color: &'static str, reach: f64, plate: (f64, f64)) -> Vec<Shape> {
    vec![
        Shape::Circle {
            cx: x,
            cy: y - 80.0,
            r: 15.0,
            fill: Some(SKIN),
            stroke: None,
            opacity: 1.0,
        },
        Shape::Line {
            x1: x,
            y1: y - 65.0,
            x2: x,
            y2: y - 20.0,
            stroke: color,
            width: 5.0,
        },
        Shape::Line {
            x1: x - reach,
            y1: y - 45.0,
            x2: x + reach,
            y2: y - 45.0,
            stroke: color,
            width: 5.0,
        },
        Shape::Rect {
            x: x - reach - plate.0,
            y: y - 52.0,
            width: plate.0,
            height: plate.1,
            fill: IRON,
        },
        Shape::Rect {
            x: x + reach,
            y: y - 52.0,
            width: plate.0,
            height: plate.1,
            fill: IRON,
        },
    ]
}

fn leg(hip_x: f64, hip_y: f64, foot_x: f64, color: &'static str) -> Shape {
    Shape::Line {
        x1: hip_x,
        y1: hip_y,
        x2: foot_x,
        y2: CANVAS_HEIGHT - FLOOR_INSET,
        stroke: color,
        width: 5.0,
    }
}

fn squat_frame(phase: f64, label: &str) -> DemoFrame {
    let center_x = CANVAS_WIDTH / 2.0;
    let center_y = CANVAS_HEIGHT / 2.0;
    let depth = phase.sin() * 0.3 + 0.7;
    let figure_y = center_y + (1.0 - depth) * 30.0;
    let spread = depth * 25.0;
    let color = "#3b82f6";

    let mut shapes = vec![floor()];
    shapes.extend(upper_body(center_x, figure_y, color, 30.0, (18.0, 12.0)));
    shapes.push(leg(center_x, figure_y - 20.0, center_x - spread, color));
    shapes.push(leg(center_x, figure_y - 20.0, center_x + spread, color));
    shapes.push(title(label));

    DemoFrame {
        gradient: Gradient::Linear,
        colors: ("#1e40af", "#7c3aed"),
        shapes,
    }
}

fn lunge_frame(phase: f64, label: &str) -> DemoFrame {
    let center_x = CANVAS_WIDTH / 2.0;
    let center_y = CANVAS_HEIGHT / 2.0;
    let lunge = phase.sin() * 0.4 + 0.6;
    let figure_x = center_x + (phase * 2.0).sin() * 10.0;
    let figure_y = center_y + (1.0 - lunge) * 25.0;
    let color = "#7c3aed";

    let mut shapes = vec![floor()];
    shapes.extend(upper_body(figure_x, figure_y, color, 25.0, (15.0, 10.0)));
    shapes.push(leg(figure_x, figure_y - 20.0, figure_x - 15.0, color));
    shapes.push(leg(
        figure_x,
        figure_y - 20.0,
        figure_x + 20.0 + lunge * 20.0,
        color,
    ));
    shapes.push(title(label));

    DemoFrame {
        gradient: Gradient::Linear,
        colors: ("#7c3aed", "#ec4899"),
        shapes,
    }
}

fn pulse_frame(phase: f64, label: &str, category: Option<&str>) -> DemoFrame {
    let center_x = CANVAS_WIDTH / 2.0;
    let center_y = CANVAS_HEIGHT / 2.0;

    let mut shapes: Vec<Shape> = (0..5)
        .map(|i| {
            let i = f64::from(i);
            Shape::Circle {
                cx: center_x,
                cy: center_y,
                r: 20.0 + i * 15.0 + (phase + i).sin() * 10.0,
                fill: None,
                stroke: Some("white"),
                opacity: 0.3,
            }
        })
        .collect();
    shapes.push(Shape::Text {
        x: center_x,
        y: center_y,
        text: label.to_string(),
        size: 16,
    });

    DemoFrame {
        gradient: Gradient::Radial,
        colors: pulse_palette(category),
        shapes,
    }
}

/// Poster shown over a real video before playback starts.
pub fn poster_svg(title: &str) -> String {
    format!(
        concat!(
            r##"<svg width="400" height="300" xmlns="http://www.w3.org/2000/svg">"##,
            r##"<defs><linearGradient id="grad" x1="0%" y1="0%" x2="100%" y2="100%">"##,
            r##"<stop offset="0%" stop-color="#1e40af"/><stop offset="100%" stop-color="#7c3aed"/>"##,
            r##"</linearGradient></defs>"##,
            r##"<rect width="100%" height="100%" fill="url(#grad)"/>"##,
            r##"<circle cx="200" cy="150" r="40" fill="white" opacity="0.9"/>"##,
            r##"<polygon points="185,135 185,165 215,150" fill="#1e40af"/>"##,
            r##"<text x="200" y="200" text-anchor="middle" fill="white" font-family="Arial" font-size="18" font-weight="bold">{}</text>"##,
            r##"<text x="200" y="220" text-anchor="middle" fill="white" font-family="Arial" font-size="12">Professional Exercise Video</text>"##,
            r##"</svg>"##
        ),
        escape_xml(title)
    )
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_wraps_after_one_period() {
        let mut demo = DemoLoop::new(DemoKind::Squat, "Dumbbell Squats", None, 240);
        assert_eq!(demo.progress(), 0.0);

        let mut last = 0.0;
        for _ in 0..239 {
            demo.tick();
            assert!(demo.progress() > last);
            last = demo.progress();
        }
        assert_eq!(demo.frame(), 239);

        demo.tick();
        assert_eq!(demo.frame(), 0);
        assert_eq!(demo.progress(), 0.0);
    }

    #[test]
    fn paused_loop_holds_its_frame() {
        let mut demo = DemoLoop::new(DemoKind::Pulse, "Exercise Demo", None, 10);
        demo.tick();
        demo.tick();
        demo.pause();
        assert_eq!(demo.tick(), 2);
        demo.resume();
        assert_eq!(demo.tick(), 3);
        demo.pause();
        demo.reset();
        assert_eq!(demo.frame(), 0);
        assert!(demo.is_playing());
    }

    #[test]
    fn animation_is_seamless_across_the_wrap() {
        let mut demo = DemoLoop::new(DemoKind::CurtsyLunge, "DB Curtsy Lunge", None, 240);
        let first = demo.render();
        for _ in 0..240 {
            demo.tick();
        }
        assert_eq!(demo.render(), first);
    }

    #[test]
    fn squat_figure_moves_between_frames() {
        let mut demo = DemoLoop::new(DemoKind::Squat, "Dumbbell Squats", None, 240);
        let start = demo.render();
        for _ in 0..30 {
            demo.tick();
        }
        assert_ne!(demo.render(), start);
    }

    #[test]
    fn kind_follows_id_then_title() {
        assert_eq!(DemoKind::select("450", None), DemoKind::Squat);
        assert_eq!(DemoKind::select("451", None), DemoKind::CurtsyLunge);
        assert_eq!(DemoKind::select("12", Some("Goblet Squat")), DemoKind::Squat);
        assert_eq!(DemoKind::select("12", Some("Plank")), DemoKind::Pulse);
    }

    #[test]
    fn svg_escapes_titles() {
        let demo = DemoLoop::new(DemoKind::Pulse, "Push <&> Pull", Some("cardio".into()), 240);
        let svg = demo.render().to_svg();
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("Push &lt;&amp;&gt; Pull"));
        assert!(svg.contains("#dc2626"));

        let poster = poster_svg("Bench \"Press\"");
        assert!(poster.contains("Bench &quot;Press&quot;"));
    }
}
