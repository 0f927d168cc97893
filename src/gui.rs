// src/gui.rs
use std::cell::RefCell;
use std::rc::Rc;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::{Duration, Instant};
use chrono::Local;
use eframe::egui;
use egui::Color32;
use egui_plot::{HLine, Plot, PlotBounds, PlotPoints, Points};
use crate::config::AppConfig;
use crate::drivers::{
    LazyTcpClient, MfcClient, Property, Sample, SampleBuffer, SimulatedMfc, Subscription,
    TcpClient,
};
use crate::engine;
use crate::recorder::{Channel, DataWriter};
use crate::session::Session;
use crate::timer::IntervalTimer;
use crate::types::*;

const LOG_LINES: usize = 8;
const SIM_LIMITS: (f64, f64) = (0.0, 100.0);

/// Everything the window keeps about one MFC.
struct DeviceView {
    name: String,
    tx_cmd: Sender<DeviceCommand>,
    endpoint: Option<String>,
    position: Property<Sample>,
    destination: Property<f64>,
    limits: Option<(f64, f64)>,
    buffer: Rc<RefCell<SampleBuffer>>,
    points: Vec<[f64; 2]>,
    // 编辑中的设定值，松手或失焦时才发送
    destination_edit: f64,
    editing: bool,
    _fill: Subscription,
}

impl DeviceView {
    fn new(name: String, tx_cmd: Sender<DeviceCommand>, capacity: usize) -> Self {
        let buffer = Rc::new(RefCell::new(SampleBuffer::with_capacity(capacity)));
        let mut position = Property::default();
        let sink = buffer.clone();
        let fill = position.subscribe(move |s: &Sample| sink.borrow_mut().push(s.timestamp, s.value));
        Self {
            name,
            tx_cmd,
            endpoint: None,
            position,
            destination: Property::default(),
            limits: None,
            buffer,
            points: Vec::new(),
            destination_edit: 0.0,
            editing: false,
            _fill: fill,
        }
    }

    fn refresh_points(&mut self, now: f64) {
        self.points = self.buffer.borrow().relative_minutes(now);
    }
}

pub struct MfcApp {
    devices: Vec<DeviceView>,
    rx: Receiver<DeviceEvent>,
    writer: DataWriter,
    session: Session,
    plot_timer: IntervalTimer,
    refresh_period: Duration,
    plot_window_minutes: f64,
    mode: ConnectionMode,
    log_messages: Vec<String>,
}

impl MfcApp {
    pub fn new(config: &AppConfig, data_dir: PathBuf) -> Self {
        let (tx, rx) = channel();
        let refresh_period = Duration::from_millis(config.refresh_interval_ms);
        let timeout = Duration::from_millis(config.timeout_ms);
        let mut devices = Vec::with_capacity(config.devices.len());
        let mut channels = Vec::with_capacity(config.devices.len());

        for (index, dev) in config.devices.iter().enumerate() {
            let (tx_cmd, rx_cmd) = channel();
            let endpoint = format!("{}:{}", dev.host, dev.port);
            // 启动后台引擎；数据写入器另开一条连接
            let writer_client: Box<dyn MfcClient> = match config.mode {
                ConnectionMode::Simulation => {
                    let sim = SimulatedMfc::new(SIM_LIMITS);
                    let engine_sim = sim.clone();
                    engine::spawn_thread(
                        index,
                        format!("simulated {}", dev.name),
                        move || Ok(engine_sim.clone()),
                        refresh_period,
                        tx.clone(),
                        rx_cmd,
                    );
                    Box::new(sim)
                }
                ConnectionMode::Hardware => {
                    let (host, port) = (dev.host.clone(), dev.port);
                    engine::spawn_thread(
                        index,
                        endpoint,
                        move || TcpClient::connect(&host, port, timeout),
                        refresh_period,
                        tx.clone(),
                        rx_cmd,
                    );
                    Box::new(LazyTcpClient::new(dev.host.clone(), dev.port, timeout))
                }
            };
            channels.push(Channel {
                name: dev.name.clone(),
                client: writer_client,
            });
            devices.push(DeviceView::new(dev.name.clone(), tx_cmd, config.buffer_capacity));
        }

        let mut plot_timer = IntervalTimer::new(Duration::from_millis(config.plot_interval_ms));
        plot_timer.start(Instant::now());
        Self {
            devices,
            rx,
            writer: DataWriter::new(data_dir, channels),
            session: Session::new(Duration::from_millis(config.poll_interval_ms)),
            plot_timer,
            refresh_period,
            plot_window_minutes: config.visible_window_minutes(),
            mode: config.mode,
            log_messages: vec!["mfc-logger ready.".to_owned()],
        }
    }

    fn log(&mut self, msg: &str) {
        self.log_messages.push(format!("> {} {}", Local::now().format("%H:%M:%S"), msg));
        if self.log_messages.len() > LOG_LINES {
            self.log_messages.remove(0);
        }
    }

    fn handle_event(&mut self, event: DeviceEvent) {
        let Some(view) = self.devices.get_mut(event.device()) else {
            log::warn!("event for unknown device: {event:?}");
            return;
        };
        match event {
            DeviceEvent::Connected { endpoint, .. } => {
                let msg = format!("{} connected ({endpoint})", view.name);
                view.endpoint = Some(endpoint);
                self.log(&msg);
            }
            DeviceEvent::Position { timestamp, value, .. } => {
                view.position.update(Sample { timestamp, value });
            }
            DeviceEvent::Destination { value, .. } => {
                view.destination.update(value);
                if !view.editing {
                    view.destination_edit = value;
                }
            }
            DeviceEvent::Limits { min, max, .. } => {
                view.limits = Some((min, max));
            }
            DeviceEvent::Error { message, .. } => {
                let msg = format!("{}: {message}", view.name);
                self.log(&msg);
            }
        }
    }

    fn on_take_data(&mut self) {
        let was_recording = self.session.is_recording();
        match self.session.on_take_data(&mut self.writer, Local::now(), Instant::now()) {
            Ok(()) if was_recording => self.log("Recording stopped."),
            Ok(()) => {
                let msg = format!("Recording to {}", self.session.filepath_label());
                self.log(&msg);
            }
            Err(e) => {
                log::error!("take data failed: {e}");
                self.log(&format!("❌ {e}"));
            }
        }
    }

    /// Poll and plot timers; both are checked once per frame.
    fn tick(&mut self) {
        let now = Instant::now();
        if let Some(Err(e)) = self.session.poll(&mut self.writer, Local::now(), now) {
            log::error!("poll failed: {e}");
            self.log(&format!("❌ {e}"));
        }
        if self.plot_timer.poll(now) {
            let t = unix_now();
            for view in &mut self.devices {
                view.refresh_points(t);
            }
        }
    }

    fn next_wakeup(&self) -> Duration {
        let now = Instant::now();
        [
            self.session.poll_timer().remaining(now),
            self.plot_timer.remaining(now),
        ]
        .into_iter()
        .flatten()
        .fold(self.refresh_period, Duration::min)
    }

    fn setpoint_tree(&mut self, ui: &mut egui::Ui) {
        egui::CollapsingHeader::new("MFC setpoints")
            .default_open(true)
            .show(ui, |ui| {
                for view in &mut self.devices {
                    egui::CollapsingHeader::new(view.name.as_str())
                        .default_open(true)
                        .show(ui, |ui| {
                            egui::Grid::new(format!("{}_grid", view.name))
                                .num_columns(2)
                                .show(ui, |ui| {
                                    ui.label("destination");
                                    let mut drag = egui::DragValue::new(&mut view.destination_edit)
                                        .speed(0.1)
                                        .max_decimals(3);
                                    if let Some((lo, hi)) = view.limits {
                                        drag = drag.clamp_range(lo..=hi);
                                    }
                                    let resp = ui.add_enabled(view.endpoint.is_some(), drag);
                                    view.editing = resp.has_focus() || resp.dragged();
                                    if resp.drag_released() || resp.lost_focus() {
                                        let value = view.destination_edit;
                                        if view.destination.get() != Some(&value) {
                                            view.tx_cmd.send(DeviceCommand::SetDestination(value)).ok();
                                        }
                                    }
                                    ui.end_row();

                                    ui.label("position");
                                    let text = view
                                        .position
                                        .get()
                                        .map(|s| format!("{:.3}", s.value))
                                        .unwrap_or_else(|| "-".to_owned());
                                    ui.monospace(text);
                                    ui.end_row();
                                });
                        });
                }
            });
    }

    fn recording_tree(&mut self, ui: &mut egui::Ui) {
        egui::CollapsingHeader::new("data recording")
            .default_open(true)
            .show(ui, |ui| {
                egui::Grid::new("recording_grid").num_columns(2).show(ui, |ui| {
                    ui.label("time elapsed");
                    ui.monospace(self.session.elapsed_label());
                    ui.end_row();

                    ui.label("filepath");
                    ui.label(self.session.filepath_label());
                    ui.end_row();

                    ui.label("take data");
                    let fill = if self.session.is_recording() { Color32::DARK_RED } else { Color32::DARK_GRAY };
                    let text = egui::RichText::new(self.session.button_text()).color(Color32::WHITE);
                    let button = egui::Button::new(text).fill(fill);
                    if ui.add_enabled(self.session.button_enabled(), button).clicked() {
                        self.on_take_data();
                    }
                    ui.end_row();
                });
            });
    }

    fn plots(&self, ui: &mut egui::Ui) {
        let n = self.devices.len().max(1) as f32;
        let spacing = ui.spacing().item_spacing.y;
        let height = ((ui.available_height() - spacing * (n - 1.0)) / n).max(80.0);
        for view in &self.devices {
            Plot::new(format!("{}_plot", view.name))
                .height(height)
                .allow_drag(false)
                .allow_zoom(false)
                .allow_scroll(false)
                .x_axis_label("minutes")
                .y_axis_label(view.name.as_str())
                .show(ui, |plot_ui| {
                    if let Some((lo, hi)) = view.limits {
                        plot_ui.set_plot_bounds(PlotBounds::from_min_max(
                            [-self.plot_window_minutes, lo],
                            [0.0, hi],
                        ));
                    }
                    if !view.points.is_empty() {
                        plot_ui.points(
                            Points::new(PlotPoints::new(view.points.clone()))
                                .radius(2.0)
                                .color(Color32::from_rgb(0, 255, 255))
                                .name("position"),
                        );
                    }
                    if let Some(&dest) = view.destination.get() {
                        plot_ui.hline(HLine::new(dest).color(Color32::YELLOW).name("destination"));
                    }
                });
        }
    }
}

impl eframe::App for MfcApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // 1. 消息处理
        while let Ok(event) = self.rx.try_recv() {
            self.handle_event(event);
        }

        // 2. 定时器
        self.tick();
        ctx.request_repaint_after(self.next_wakeup());

        // 3. UI 绘制
        let width = ctx.screen_rect().width() / 3.0;
        egui::SidePanel::left("tree").default_width(width).show(ctx, |ui| {
            ui.heading("mfc-logger");
            if self.mode == ConnectionMode::Simulation {
                ui.label(egui::RichText::new("Simulation mode").color(Color32::YELLOW).small());
            }
            ui.separator();
            egui::ScrollArea::vertical().max_height((ui.available_height() - 140.0).max(120.0)).show(ui, |ui| {
                self.setpoint_tree(ui);
                self.recording_tree(ui);
            });
            ui.separator();
            egui::ScrollArea::vertical()
                .id_source("log")
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    for m in &self.log_messages {
                        ui.monospace(m);
                    }
                });
        });

        egui::CentralPanel::default().show(ctx, |ui| self.plots(ui));
    }
}

impl Drop for MfcApp {
    fn drop(&mut self) {
        for view in &self.devices {
            view.tx_cmd.send(DeviceCommand::Shutdown).ok();
        }
    }
}
