//! # Beat Indicator Widget
//!
//! One light per beat of the bar; the current beat is lit. Accented beats
//! light red, count-in beats blue, subdivision ticks dim the current light.

use iced::widget::canvas::{self, Geometry, Path, Stroke};
use iced::widget::container;
use iced::{Color, Element, Point, Rectangle, Renderer, Theme, mouse};
use shakuhachi_core::metronome::Beat;

const HEIGHT: f32 = 60.0;

const IDLE_COLOR: Color = Color::from_rgb(0.25, 0.25, 0.25);
const BEAT_COLOR: Color = Color::from_rgb(0.2, 0.86, 0.6);
const ACCENT_COLOR: Color = Color::from_rgb(1.0, 0.2, 0.2);
const COUNT_IN_COLOR: Color = Color::from_rgb(0.3, 0.55, 1.0);

pub struct BeatIndicator {
    beats_per_bar: u8,
    current: Option<Beat>,
}

impl BeatIndicator {
    pub fn new(beats_per_bar: u8, current: Option<Beat>) -> Self {
        Self { beats_per_bar: beats_per_bar.max(1), current }
    }

    pub fn view(self) -> Element<'static, crate::Message> {
        container(
            canvas::Canvas::new(self)
                .width(iced::Length::Fill)
                .height(iced::Length::Fixed(HEIGHT)),
        )
        .into()
    }

    fn color_for(&self, beat: u8) -> Color {
        match self.current {
            Some(current) if current.beat == beat => {
                let color = if current.count_in {
                    COUNT_IN_COLOR
                } else if current.accent {
                    ACCENT_COLOR
                } else {
                    BEAT_COLOR
                };
                if current.subdivision { Color { a: 0.45, ..color } } else { color }
            }
            _ => IDLE_COLOR,
        }
    }
}

impl<Message> canvas::Program<Message> for BeatIndicator {
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

        // A running metronome may be a bar ahead of a signature change.
        let beats = self
            .current
            .map_or(self.beats_per_bar, |beat| beat.time_signature.numerator().max(1));
        let slot = bounds.width / beats as f32;
        let radius = (slot / 2.0 - 6.0).clamp(4.0, bounds.height / 2.0 - 4.0);

        for beat in 1..=beats {
            let center = Point::new(slot * (beat as f32 - 0.5), bounds.height / 2.0);
            let light = Path::circle(center, radius);
            frame.fill(&light, self.color_for(beat));
            frame.stroke(&light, Stroke::default().with_width(1.0).with_color(Color::WHITE));
        }

        vec![frame.into_geometry()]
    }
}
