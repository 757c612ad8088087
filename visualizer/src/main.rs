use iced::{
    mouse, time,
    widget::{
        button,
        canvas::{self, Canvas, Frame, Geometry},
        column, row, scrollable, text, text_input, Column, Container,
    },
    Alignment, Color, Element, Length, Point, Rectangle, Renderer, Size, Subscription, Task,
    Theme,
};
use serde::Serialize;
use sonarcore::processing::{PixelBuffer, SystemClock, ThermoclineDecorator};
use sonarcore::{DisplayConfig, FrameComposer, FrameUpdate, Ping, RenderTuning};
use std::time::Duration;

/// One ping every ~71 ms, the instrument's native rate.
const PING_INTERVAL: Duration = Duration::from_millis(71);
const BRIDGE: &str = "http://127.0.0.1:9000";

fn main() -> iced::Result {
    iced::application(Visualizer::boot, Visualizer::update, Visualizer::view)
        .title(application_title)
        .subscription(application_subscription)
        .theme(application_theme)
        .run()
}

fn application_title(_: &Visualizer) -> String {
    "Sonar Echogram Viewer".into()
}

fn application_subscription(state: &Visualizer) -> Subscription<Message> {
    if state.playing {
        time::every(PING_INTERVAL).map(|_| Message::Tick)
    } else {
        Subscription::none()
    }
}

fn application_theme(_: &Visualizer) -> Theme {
    Theme::Dark
}

#[derive(Debug)]
struct Visualizer {
    composer: Option<FrameComposer>,
    pings: Vec<Ping>,
    index: usize,
    playing: bool,
    runs: Vec<ColorRun>,
    raster: Size,
    overlay: String,
    sensitivity: String,
    generator: GeneratorForm,
    status: String,
    history: Vec<String>,
}

#[derive(Debug, Clone)]
enum Message {
    Tick,
    PingsFetched(Result<Vec<Ping>, String>),
    TogglePlay,
    Reset,
    NextResolution,
    ToggleColorMode,
    SensitivityChanged(String),
    ApplySensitivity,
    GeneratorFieldChanged(GeneratorField, String),
    SubmitGenerator,
    GeneratorSubmitted(Result<String, String>),
}

#[derive(Debug, Clone, Copy)]
enum GeneratorField {
    Pings,
    Seed,
    DropoutRate,
    Description,
}

impl Visualizer {
    fn boot() -> (Self, Task<Message>) {
        let display = DisplayConfig::default();
        let raster = Size::new(display.width as f32, display.height as f32);
        let sensitivity = format!("{:.0}", display.sensitivity);
        let (composer, status) = match FrameComposer::new(display, RenderTuning::default()) {
            Ok(composer) => (
                Some(composer.with_decorator(Box::new(ThermoclineDecorator::new(Box::new(
                    SystemClock::new(),
                ))))),
                "Fetching pings...".to_string(),
            ),
            Err(err) => (None, format!("Renderer error: {err}")),
        };
        (
            Visualizer {
                composer,
                pings: Vec::new(),
                index: 0,
                playing: true,
                runs: Vec::new(),
                raster,
                overlay: String::new(),
                sensitivity,
                generator: GeneratorForm::default(),
                status,
                history: Vec::new(),
            },
            Task::perform(fetch_pings(), Message::PingsFetched),
        )
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => {
                if !state.pings.is_empty() {
                    state.index = (state.index + 1) % state.pings.len();
                    state.redraw();
                }
                Task::none()
            }
            Message::PingsFetched(Ok(pings)) => {
                state.push_history(format!("Loaded {} pings", pings.len()));
                state.status = format!("Playing {} pings", pings.len());
                state.pings = pings;
                state.index = 0;
                if let Some(composer) = state.composer.as_mut() {
                    composer.reset();
                }
                state.redraw();
                Task::none()
            }
            Message::PingsFetched(Err(err)) => {
                state.status = format!("Bridge error: {err}");
                Task::none()
            }
            Message::TogglePlay => {
                state.playing = !state.playing;
                Task::none()
            }
            Message::Reset => {
                state.index = 0;
                if let Some(composer) = state.composer.as_mut() {
                    composer.reset();
                }
                state.redraw();
                state.push_history("Reset to first ping".into());
                Task::none()
            }
            Message::NextResolution => {
                state.reconfigure(|display| display.resolution = display.resolution.next());
                Task::none()
            }
            Message::ToggleColorMode => {
                state.reconfigure(|display| display.color_mode = display.color_mode.toggle());
                Task::none()
            }
            Message::SensitivityChanged(value) => {
                state.sensitivity = value;
                Task::none()
            }
            Message::ApplySensitivity => {
                match state.sensitivity.trim().parse::<f32>() {
                    Ok(value) => state.reconfigure(|display| display.sensitivity = value),
                    Err(_) => state.status = format!("Invalid sensitivity {:?}", state.sensitivity),
                }
                Task::none()
            }
            Message::GeneratorFieldChanged(field, value) => {
                state.generator.update_field(field, value);
                Task::none()
            }
            Message::SubmitGenerator => {
                let payload = state.generator.to_payload();
                Task::perform(post_generator(payload), Message::GeneratorSubmitted)
            }
            Message::GeneratorSubmitted(Ok(message)) => {
                state.status = message;
                state.push_history("Scenario submitted".into());
                Task::perform(fetch_pings(), Message::PingsFetched)
            }
            Message::GeneratorSubmitted(Err(err)) => {
                state.status = format!("Scenario error: {err}");
                Task::none()
            }
        }
    }

    fn reconfigure(&mut self, change: impl FnOnce(&mut DisplayConfig)) {
        let Some(composer) = self.composer.as_mut() else {
            return;
        };
        let mut display = composer.display().clone();
        change(&mut display);
        let label = display.mode_label();
        match composer.reconfigure(display) {
            Ok(()) => {
                self.push_history(format!("Display: {label}"));
                self.redraw();
            }
            Err(err) => self.status = format!("Display error: {err}"),
        }
    }

    /// Renders the current ping and caches the raster as color runs.
    fn redraw(&mut self) {
        let Some(composer) = self.composer.as_mut() else {
            return;
        };
        let update = composer.render(&self.pings, self.index);
        if let FrameUpdate::Rebuilt { columns } = update {
            self.history.push(format!("Rebuilt {columns} columns"));
        }
        self.runs = color_runs(composer.pixels());
        self.raster = Size::new(
            composer.pixels().width() as f32,
            composer.pixels().height() as f32,
        );
        self.overlay = composer
            .overlay()
            .map(|overlay| overlay.summary())
            .unwrap_or_else(|| "No pings".into());
        self.trim_history();
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let echogram = Canvas::new(Echogram {
            runs: state.runs.clone(),
            raster: state.raster,
        })
        .width(Length::Fixed(state.raster.width))
        .height(Length::Fixed(state.raster.height));

        let metrics = state
            .composer
            .as_ref()
            .map(|composer| composer.metrics())
            .unwrap_or_default();

        let controls = row![
            button(if state.playing { "Pause" } else { "Play" })
                .on_press(Message::TogglePlay)
                .padding(8),
            button("Reset").on_press(Message::Reset).padding(8),
            button("Resolution").on_press(Message::NextResolution).padding(8),
            button("Color mode").on_press(Message::ToggleColorMode).padding(8),
            text_input("Sensitivity 0-100", &state.sensitivity)
                .on_input(Message::SensitivityChanged)
                .on_submit(Message::ApplySensitivity)
                .padding(6)
                .width(Length::Fixed(140.0)),
            button("Apply").on_press(Message::ApplySensitivity).padding(8),
        ]
        .spacing(8)
        .align_y(Alignment::Center);

        let history_list = if state.history.is_empty() {
            Column::new().push(text("No activity yet").size(12))
        } else {
            state
                .history
                .iter()
                .rev()
                .fold(Column::new().spacing(4), |col, entry| {
                    col.push(text(entry.clone()).size(12))
                })
        };

        let echogram_column = column![
            text("Echogram").size(26),
            text(&state.overlay).size(16),
            echogram,
            controls,
            text(format!(
                "Columns {} | rebuilds {} | advances {} | bottom holds {}",
                metrics.columns_rendered, metrics.rebuilds, metrics.advances, metrics.bottom_holds
            ))
            .size(12),
            text(&state.status).size(14),
        ]
        .spacing(10)
        .padding(16);

        let scenario_column = column![
            text("Scenario").size(26),
            text_input("Pings", &state.generator.pings)
                .on_input(|value| Message::GeneratorFieldChanged(GeneratorField::Pings, value))
                .padding(6),
            text_input("Seed", &state.generator.seed)
                .on_input(|value| Message::GeneratorFieldChanged(GeneratorField::Seed, value))
                .padding(6),
            text_input("Dropout rate", &state.generator.dropout_rate)
                .on_input(|value| {
                    Message::GeneratorFieldChanged(GeneratorField::DropoutRate, value)
                })
                .padding(6),
            text_input("Description", &state.generator.description)
                .on_input(|value| {
                    Message::GeneratorFieldChanged(GeneratorField::Description, value)
                })
                .padding(6),
            button("POST scenario")
                .on_press(Message::SubmitGenerator)
                .padding(10),
            text("Activity log").size(16),
            Container::new(scrollable(history_list).height(Length::Fixed(200.0))).padding(6),
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fixed(300.0));

        let layout = row![echogram_column, scenario_column]
            .spacing(20)
            .align_y(Alignment::Start)
            .padding(20);

        Container::new(layout)
            .width(Length::Fill)
            .height(Length::Fill)
            .center_y(Length::Fill)
            .into()
    }

    fn push_history(&mut self, entry: String) {
        self.history.push(entry);
        self.trim_history();
    }

    fn trim_history(&mut self) {
        if self.history.len() > 20 {
            let excess = self.history.len() - 20;
            self.history.drain(..excess);
        }
    }
}

async fn fetch_pings() -> Result<Vec<Ping>, String> {
    let response = reqwest::get(format!("{BRIDGE}/pings"))
        .await
        .map_err(|e| e.to_string())?;
    response.json::<Vec<Ping>>().await.map_err(|e| e.to_string())
}

async fn post_generator(config: ScenarioConfig) -> Result<String, String> {
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{BRIDGE}/ingest-config"))
        .json(&config)
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if response.status().is_success() {
        Ok("Scenario submitted".into())
    } else {
        let status = response.status();
        let text = response.text().await.unwrap_or_else(|_| "".into());
        Err(format!("{}: {}", status, text))
    }
}

#[derive(Debug, Clone)]
struct GeneratorForm {
    pings: String,
    seed: String,
    dropout_rate: String,
    description: String,
}

impl Default for GeneratorForm {
    fn default() -> Self {
        Self {
            pings: "400".into(),
            seed: "7".into(),
            dropout_rate: "0.02".into(),
            description: "Viewer scenario".into(),
        }
    }
}

impl GeneratorForm {
    fn update_field(&mut self, field: GeneratorField, value: String) {
        match field {
            GeneratorField::Pings => self.pings = value,
            GeneratorField::Seed => self.seed = value,
            GeneratorField::DropoutRate => self.dropout_rate = value,
            GeneratorField::Description => self.description = value,
        }
    }

    fn to_payload(&self) -> ScenarioConfig {
        ScenarioConfig {
            pings: self.pings.parse().ok(),
            seed: self.seed.parse().ok(),
            dropout_rate: self.dropout_rate.parse().ok(),
            description: if self.description.trim().is_empty() {
                None
            } else {
                Some(self.description.clone())
            },
        }
    }
}

/// Partial generator config; omitted fields keep the bridge defaults.
#[derive(Debug, Serialize)]
struct ScenarioConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pings: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dropout_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

/// Vertical run of identically colored pixels in one raster column.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ColorRun {
    x: usize,
    y: usize,
    len: usize,
    rgba: [u8; 4],
}

fn color_runs(pixels: &PixelBuffer) -> Vec<ColorRun> {
    let mut runs = Vec::new();
    for x in 0..pixels.width() {
        let mut current: Option<ColorRun> = None;
        for y in 0..pixels.height() {
            let Some(rgba) = pixels.pixel(x, y) else {
                continue;
            };
            match current.as_mut() {
                Some(run) if run.rgba == rgba => run.len += 1,
                _ => {
                    runs.extend(current.take());
                    current = Some(ColorRun { x, y, len: 1, rgba });
                }
            }
        }
        runs.extend(current);
    }
    runs
}

#[derive(Clone)]
struct Echogram {
    runs: Vec<ColorRun>,
    raster: Size,
}

impl canvas::Program<Message> for Echogram {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        if self.raster.width <= 0.0 || self.raster.height <= 0.0 {
            return vec![frame.into_geometry()];
        }
        let sx = bounds.width / self.raster.width;
        let sy = bounds.height / self.raster.height;

        for run in &self.runs {
            let [r, g, b, a] = run.rgba;
            frame.fill_rectangle(
                Point::new(run.x as f32 * sx, run.y as f32 * sy),
                Size::new(sx, run.len as f32 * sy),
                Color::from_rgba8(r, g, b, a as f32 / 255.0),
            );
        }

        vec![frame.into_geometry()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_merge_vertical_spans() {
        let mut pixels = PixelBuffer::new(2, 4, [0, 0, 0, 255]);
        pixels.fill_span(1, 2, 2, [9, 9, 9, 255]);
        let runs = color_runs(&pixels);
        assert_eq!(runs.len(), 4);
        assert_eq!(runs[0], ColorRun { x: 0, y: 0, len: 4, rgba: [0, 0, 0, 255] });
        assert_eq!(runs[2], ColorRun { x: 1, y: 2, len: 1, rgba: [9, 9, 9, 255] });
        assert_eq!(runs[3].len, 1);
    }

    #[test]
    fn scenario_payload_skips_unparsed_fields() {
        let form = GeneratorForm {
            pings: "abc".into(),
            description: " ".into(),
            ..GeneratorForm::default()
        };
        let json = serde_json::to_value(form.to_payload()).unwrap();
        assert!(json.get("pings").is_none());
        assert!(json.get("description").is_none());
        assert_eq!(json["seed"], 7);
    }
}
