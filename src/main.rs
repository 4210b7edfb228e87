mod cli;
mod config;
mod files;
mod gesture;
mod input;
mod keybind;
mod layout;
mod loader;
mod ui;
mod viewer;

use clap::Parser;
use std::sync::{Arc, Mutex};
use winit::event_loop::EventLoop;

use crate::cli::Cli;
use crate::config::Config;
use crate::keybind::KeybindRegistry;
use crate::loader::{FileSource, HttpSource, ImageLoader, RoutedSource, Wake};
use crate::ui::{App, UserEvent};

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = Config::resolve(&cli)?;
    if config.images.is_empty() {
        log::warn!("No images configured.");
    }

    let event_loop = EventLoop::<UserEvent>::with_user_event().build()?;
    let proxy = Mutex::new(event_loop.create_proxy());
    let wake: Wake = Arc::new(move || {
        if let Ok(proxy) = proxy.lock() {
            let _ = proxy.send_event(UserEvent::LoadFinished);
        }
    });

    let source = RoutedSource::new(FileSource, HttpSource::new());
    let loader = ImageLoader::spawn(Arc::new(source), wake, cli.workers);
    let keybinds = KeybindRegistry::from_config(&config.keybinds);

    let mut app = App::new(config, keybinds, loader);
    event_loop.run_app(&mut app)?;
    Ok(())
}
