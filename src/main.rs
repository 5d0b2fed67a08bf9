use std::{
    path::PathBuf,
    process::ExitCode,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Context;
use chromium_embed_shell::{
    app::{App, AppEvent},
    bindings::default_bindings,
    bridge::{Bridge, PagePrinter, PrintFunction},
    chromium::CefEngine,
    config::{Config, parse_switch},
    constants::HOST_LANGUAGE,
    engine::Engine,
    handlers::{
        AfterCreatedAnnouncer, ClientDispatch, ClientHandlers, ConsoleInterceptor, FocusFix,
        HeaderRewriter, PageLoadHandler,
    },
    shared::{Platform, ShellEvent},
    shell::HostShell,
    window::{CloseOutcome, FrameController, HandleSignal},
};
use clap::Parser;
use flume::Receiver;
use tracing::{Level, debug, error, info};
use winit::{
    event_loop::EventLoop,
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
};

#[derive(Parser, Debug)]
#[command(version, ignore_errors(true))]
struct Args {
    /// Verbose logging
    #[arg(short, long)]
    dev: bool,
    /// Startup url
    #[arg(short, long)]
    url: Option<String>,
    /// Inline html to load instead of an url
    #[arg(long)]
    html: Option<String>,
    /// Config file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Override the browser user agent
    #[arg(long)]
    user_agent: Option<String>,
    /// Extra engine switch, as name or name=value
    #[arg(short, long = "switch")]
    switches: Vec<String>,
    /// Let the engine own the window and block in its message loop
    #[arg(short, long)]
    blocking: bool,
}

impl Args {
    fn apply(&self, config: &mut Config) -> anyhow::Result<()> {
        if let Some(url) = &self.url {
            config.navigation.url = Some(url.clone());
            config.navigation.html = None;
        }

        if let Some(html) = &self.html {
            config.navigation.html = Some(html.clone());
        }

        if let Some(user_agent) = &self.user_agent {
            config.engine.user_agent = Some(user_agent.clone());
        }

        for switch in &self.switches {
            parse_switch(switch)?;
            config.engine.switches.push(switch.clone());
        }

        // The engine's own loop schedules its work.
        if self.blocking {
            config.engine.external_message_pump = false;
        }

        Ok(())
    }
}

fn main() -> ExitCode {
    let (sender, receiver) = flume::unbounded::<ShellEvent>();

    let mut engine = CefEngine::new(sender.clone());
    if let Some(code) = engine.execute_process() {
        return ExitCode::from(code as u8);
    }

    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(match args.dev {
            true => Level::DEBUG,
            false => Level::INFO,
        })
        .init();

    match run(args, engine, sender, receiver) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(
    args: Args,
    engine: CefEngine,
    sender: flume::Sender<ShellEvent>,
    receiver: Receiver<ShellEvent>,
) -> anyhow::Result<()> {
    let mut config = Config::load(args.config.as_deref()).context("Failed to load config")?;
    args.apply(&mut config)?;

    let settings = config.engine_settings()?;
    let target = config.navigation_target()?.to_string();

    let mut shell = HostShell::initialize(engine, &settings)
        .context("Failed to initialize the engine")?
        .with_tick_interval(config.tick_interval());

    let version = shell.engine().version();
    let platform = Platform::current();

    let print_function = PrintFunction::new(&config.console.printer, HOST_LANGUAGE);
    let bindings = default_bindings(
        print_function,
        &version.to_string(),
        config.bridge.bind_to_frames,
    )?;
    let bridge = Bridge::attach(bindings);
    let printer = PagePrinter::new(bridge.clone(), &config.console.printer, HOST_LANGUAGE);

    let mut handlers = ClientHandlers::new()
        .with_life_span(AfterCreatedAnnouncer::new(printer.clone()))
        .with_load(PageLoadHandler::new(printer.clone(), config.bridge.zoom_delta))
        .with_display(ConsoleInterceptor::new(&config.console.filters, printer))
        .with_focus(FocusFix::new(platform));

    if !config.headers.is_empty() {
        handlers = handlers.with_request(HeaderRewriter::new(config.headers.clone()));
    }

    let client = ClientDispatch::new(handlers)
        .with_bridge(bridge)
        .with_events(sender);

    if args.blocking {
        shell.run_blocking(&config.window.title, &target, client)?;
        shell.shutdown()?;
        return Ok(());
    }

    #[cfg(target_os = "linux")]
    let mut event_loop = {
        use winit::platform::x11::EventLoopBuilderExtX11;
        EventLoop::builder().with_x11().build()?
    };

    #[cfg(not(target_os = "linux"))]
    let mut event_loop = EventLoop::new()?;

    let mut app = App::new(config.window.clone());
    let mut controller =
        FrameController::new(platform, target, Arc::new(client), shell.registry());

    // Browser whose final close the loop is waiting for.
    let mut closing = None;

    loop {
        let timeout = shell
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
            .unwrap_or(Duration::ZERO);

        if let PumpStatus::Exit(code) = event_loop.pump_app_events(Some(timeout), &mut app) {
            debug!("Event loop exited with {code}");
            break;
        }

        shell.tick(Instant::now());

        let mut fatal = None;
        let mut last_window_closed = false;

        app.events(|event| match event {
            AppEvent::Created { handle, bounds }
                if controller.handle_signal() == HandleSignal::Created =>
            {
                fatal = controller.handle_ready(&mut shell, handle, bounds).err();
            }
            AppEvent::FirstRedraw { handle, bounds }
                if controller.handle_signal() == HandleSignal::FirstRedraw =>
            {
                fatal = controller.handle_ready(&mut shell, handle, bounds).err();
            }
            AppEvent::Resized(bounds) => controller.on_resize(bounds),
            AppEvent::Focused => controller.on_focus(),
            AppEvent::CloseRequested => {
                let browser = controller.browser_id();
                if controller.on_close() == CloseOutcome::LastWindowClosed {
                    last_window_closed = true;
                    closing = browser;
                }
            }
            _ => {}
        });

        if let Some(e) = fatal {
            return Err(e).context("Failed to embed the browser");
        }

        let mut closed = last_window_closed && closing.is_none();

        receiver.try_iter().for_each(|event| match event {
            ShellEvent::ScheduleWork(at) => shell.schedule_work(at),
            ShellEvent::BrowserClosed(id) if closing == Some(id) => closed = true,
            event => debug!("{event:?}"),
        });

        if closed {
            info!("Last window closed");
            app.close();
            break;
        }
    }

    shell.shutdown()?;

    Ok(())
}
