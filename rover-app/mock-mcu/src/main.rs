use clap::{Parser, ValueEnum};
use embassy_executor::Executor;
use embassy_time::Delay;
use rover_core::utils::config::{RoverConfig, MAX_CHANNELS};
use rover_core::utils::controllers::{ChannelMap, ChannelSource, DryRunMotors, LedModule};
use rover_core::utils::SystemController;
use smart_leds_trait::{SmartLedsWrite, RGB8};
use static_cell::StaticCell;
use std::convert::Infallible;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Scenario {
    /// Throttle only, straight ahead
    Straight,
    /// Throttle with yaw to the right
    Turn,
    /// Spin mode, rotating in place
    Spin,
    /// Straight ahead, then the receiver loses signal halfway through
    Failsafe,
}

#[derive(Parser)]
#[clap(version = "1.0")]
struct Opts
{
    /// stick pattern fed to the control loop
    #[clap(long, value_enum, default_value = "straight")]
    scenario: Scenario,
    /// number of ticks to run before stopping
    #[clap(long, default_value_t = 40)]
    ticks: usize,
    /// JSON configuration file
    #[clap(long)]
    config: Option<PathBuf>,
    /// override the tick interval from the configuration
    #[clap(long)]
    tick_ms: Option<u64>,
}

/// Receiver stand-in that replays one pulse pattern per tick.
struct ScriptedReceiver {
    map: ChannelMap,
    scenario: Scenario,
    step: usize,
    ticks: usize,
}

impl ScriptedReceiver {
    fn pulses(&self) -> [u16; MAX_CHANNELS as usize] {
        // (steer, yaw, throttle, spin, mode)
        let (steer, yaw, throttle, spin, mode) = match self.scenario {
            Scenario::Straight => (1500, 1500, 1646, 1500, 1000),
            Scenario::Turn => (1500, 1750, 1646, 1500, 1000),
            Scenario::Spin => (1500, 1500, 1323, 1100, 2000),
            Scenario::Failsafe if self.step < self.ticks / 2 => (1500, 1500, 1646, 1500, 1000),
            Scenario::Failsafe => return [0; MAX_CHANNELS as usize],
        };
        let mut out = [0; MAX_CHANNELS as usize];
        out[self.map.steer as usize] = steer;
        out[self.map.yaw as usize] = yaw;
        out[self.map.throttle as usize] = throttle;
        out[self.map.spin as usize] = spin;
        out[self.map.mode as usize] = mode;
        out
    }
}

impl ChannelSource for ScriptedReceiver {
    fn pulse_width(
        &mut self,
        channel: u8,
    ) -> u16 {
        self.pulses().get(channel as usize).copied().unwrap_or(0)
    }
}

// LED driver that logs to console
struct SerialLedDriver;

impl SmartLedsWrite for SerialLedDriver {
    type Color = RGB8;
    type Error = Infallible;

    fn write<T, I>(
        &mut self,
        iterator: T,
    ) -> Result<(), Self::Error>
    where
        T: IntoIterator<Item = I>,
        I: Into<Self::Color>,
    {
        for c in iterator {
            let c: RGB8 = c.into();
            info!("LED: {:?}", c);
        }
        Ok(())
    }
}

type Rover = SystemController<ScriptedReceiver, DryRunMotors, LedModule<SerialLedDriver>>;

#[embassy_executor::task]
async fn control_task(mut rover: Rover, ticks: usize) {
    let mut delay = Delay;
    for step in 0..ticks {
        rover.source.step = step;
        rover.run_for(1, &mut delay).await;
    }
    rover.shutdown();
    info!(ticks, "scenario finished");
    std::process::exit(0);
}

fn load_config(opts: &Opts) -> Result<RoverConfig, String> {
    let mut config = match &opts.config {
        Some(path) => {
            let bytes = std::fs::read(path).map_err(|e| format!("{}: {}", path.display(), e))?;
            RoverConfig::from_json(&bytes).map_err(|e| format!("{}: {}", path.display(), e))?
        }
        None => RoverConfig::default(),
    };
    if let Some(tick_ms) = opts.tick_ms {
        config.tick_ms = tick_ms;
        config.validate().map_err(|e| e.to_string())?;
    }
    Ok(config)
}

static EXECUTOR: StaticCell<Executor> = StaticCell::new();

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let opts: Opts = Opts::parse();
    let config = match load_config(&opts) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    info!(scenario = ?opts.scenario, ticks = opts.ticks, ?config, "starting mock rover");

    let receiver = ScriptedReceiver {
        map: config.channels,
        scenario: opts.scenario,
        step: 0,
        ticks: opts.ticks,
    };
    let leds = LedModule::new(SerialLedDriver, RGB8 { r: 0, g: 0, b: 255 });
    let rover = SystemController::with_config(receiver, DryRunMotors::new(), leds, &config);

    let executor = EXECUTOR.init(Executor::new());
    executor.run(|spawner| {
        spawner.spawn(control_task(rover, opts.ticks)).unwrap();
    });
}
