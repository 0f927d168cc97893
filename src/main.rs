// src/main.rs
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]
mod config;
mod drivers;
mod engine;
mod gui;
mod recorder;
mod session;
mod timer;
mod types;
use std::path::PathBuf;
use anyhow::{anyhow, Result};
use eframe::egui;
use config::{AppConfig, DEFAULT_CONFIG_FILE};
// 入口函数：可选的第一个参数是配置文件路径
fn main() -> Result<()> {
    env_logger::init();
    let config_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let config = AppConfig::load_or_default(&config_path)?;
    let data_dir = config.data_dir()?;
    log::info!(
        "{:?} mode, {} devices, writing to {}",
        config.mode,
        config.devices.len(),
        data_dir.display()
    );
    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([1200.0, 800.0])
        .with_min_inner_size([800.0, 600.0])
        .with_title("mfc-logger");
    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    eframe::run_native(
        "mfc-logger",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            Box::new(gui::MfcApp::new(&config, data_dir))
        }),
    )
    .map_err(|e| anyhow!("GUI terminated: {e}"))
}
