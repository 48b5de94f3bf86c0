//! # Flute Diagram Widget
//!
//! A side view of the calculated flute drawn to scale: the bore, the wall,
//! every finger hole at its position and the thumb hole on the back.
//!
//! ## Features
//! - Length-proportional hole placement with dimension labels
//! - Thumb hole drawn hollow, below the bore line
//! - Holes outside the flute and moved alternates highlighted

use iced::alignment;
use iced::widget::canvas::{self, Geometry, Path, Stroke};
use iced::widget::container;
use iced::{Color, Element, Pixels, Point, Rectangle, Renderer, Size, Theme, mouse};
use shakuhachi_core::CalculationResult;

const MARGIN: f32 = 30.0;
const HEIGHT: f32 = 150.0;

const BORE_COLOR: Color = Color::from_rgb(0.18, 0.14, 0.10);
const WALL_COLOR: Color = Color::from_rgb(0.72, 0.58, 0.36);
const HOLE_COLOR: Color = Color::from_rgb(0.95, 0.95, 0.95);
const ALTERNATE_COLOR: Color = Color::from_rgb(1.0, 0.84, 0.0);
const ERROR_COLOR: Color = Color::from_rgb(1.0, 0.2, 0.2);
const LABEL_COLOR: Color = Color::from_rgb(0.8, 0.8, 0.8);

#[derive(Debug, Clone)]
struct DiagramHole {
    number: usize,
    position: f64,
    is_thumb: bool,
    error: bool,
    alternate: Option<f64>,
}

/// Scale drawing of one calculated flute.
#[derive(Debug, Clone)]
pub struct FluteDiagram {
    length: f64,
    bore_diameter: f64,
    wall_thickness: f64,
    hole_diameter: f64,
    holes: Vec<DiagramHole>,
}

impl FluteDiagram {
    pub fn new(result: &CalculationResult) -> Self {
        Self {
            length: result.geometry.length,
            bore_diameter: result.geometry.bore_diameter,
            wall_thickness: result.geometry.wall_thickness,
            hole_diameter: result.geometry.hole_diameter,
            holes: result
                .holes
                .iter()
                .map(|hole| DiagramHole {
                    number: hole.hole,
                    position: hole.position,
                    is_thumb: hole.is_thumb,
                    error: hole.error,
                    alternate: hole.alternate_position,
                })
                .collect(),
        }
    }

    pub fn view(self) -> Element<'static, crate::Message> {
        container(
            canvas::Canvas::new(self)
                .width(iced::Length::Fill)
                .height(iced::Length::Fixed(HEIGHT)),
        )
        .into()
    }
}

fn label(frame: &mut canvas::Frame, content: String, position: Point) {
    frame.fill_text(canvas::Text {
        content,
        position,
        color: LABEL_COLOR,
        size: Pixels(12.0),
        horizontal_alignment: alignment::Horizontal::Center,
        vertical_alignment: alignment::Vertical::Center,
        ..canvas::Text::default()
    });
}

impl<Message> canvas::Program<Message> for FluteDiagram {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());
        if self.length <= 0.0 {
            return vec![frame.into_geometry()];
        }

        let usable = (bounds.width - 2.0 * MARGIN).max(1.0);
        let scale = usable / self.length as f32;
        let x_of = |mm: f64| MARGIN + mm as f32 * scale;

        // The bore is exaggerated so thin flutes stay visible.
        let bore = (self.bore_diameter as f32 * scale).max(18.0);
        let wall = (self.wall_thickness as f32 * scale).max(3.0);
        let center_y = bounds.height / 2.0;
        let top = center_y - bore / 2.0;

        let outer = Path::rectangle(
            Point::new(MARGIN, top - wall),
            Size::new(usable, bore + 2.0 * wall),
        );
        frame.fill(&outer, WALL_COLOR);
        let inner = Path::rectangle(Point::new(MARGIN, top), Size::new(usable, bore));
        frame.fill(&inner, BORE_COLOR);

        let radius = (self.hole_diameter as f32 * scale / 2.0).clamp(3.0, bore / 2.0);
        for hole in &self.holes {
            let x = x_of(hole.position.clamp(0.0, self.length));
            let color = if hole.error { ERROR_COLOR } else { HOLE_COLOR };

            if hole.is_thumb {
                // On the back: drawn hollow under the bore.
                let center = Point::new(x, top + bore + wall + radius + 4.0);
                frame.stroke(&Path::circle(center, radius), Stroke::default().with_width(2.0).with_color(color));
            } else {
                frame.fill(&Path::circle(Point::new(x, center_y), radius), color);
            }
            label(&mut frame, format!("{}", hole.number), Point::new(x, top - wall - 22.0));
            label(&mut frame, format!("{:.0}", hole.position), Point::new(x, top - wall - 9.0));

            if let Some(alternate) = hole.alternate {
                let ax = x_of(alternate.clamp(0.0, self.length));
                let marker = Path::line(Point::new(ax, top), Point::new(ax, top + bore));
                frame.stroke(&marker, Stroke::default().with_width(2.0).with_color(ALTERNATE_COLOR));
            }
        }

        // Overall length along the bottom edge.
        let y = bounds.height - 12.0;
        let dimension = Path::line(Point::new(MARGIN, y), Point::new(MARGIN + usable, y));
        frame.stroke(&dimension, Stroke::default().with_width(1.0).with_color(LABEL_COLOR));
        label(&mut frame, format!("{:.0} mm", self.length), Point::new(bounds.width / 2.0, y - 8.0));
        label(&mut frame, "blowing end".to_string(), Point::new(MARGIN + 30.0, y - 8.0));

        vec![frame.into_geometry()]
    }
}
