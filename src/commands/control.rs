//! Control command implementation
//!
//! Runs the main control loop: one tick per second until a termination
//! signal arrives, then hand the fan back to the firmware.

use crate::cli::Cli;
use crate::config::ConfigFile;
use crate::domain::{Command, FanLevel, LevelToken, RuleTable};
use crate::error::{AppError, Result};
use crate::platform::{Clock, ControlSink, HwmonSensors, SensorSource, SystemClock, TpacpiFan};
use crate::services::engine::DEFAULT_TICK_HYSTERESIS;
use crate::services::{Decision, FanDecisionEngine, WatchdogKeeper};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Time between ticks
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Lifecycle of the control loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Constructed, watchdog not armed yet
    Idle,
    /// Ticking
    Running,
    /// Cancellation seen, restoring automatic mode
    Stopping,
    /// Finished
    Terminated,
}

/// Drives the decision engine and watchdog keeper once per tick
pub struct ControlLoop<Src, Snk, Clk> {
    sensors: Src,
    sink: Snk,
    clock: Clk,
    engine: FanDecisionEngine,
    watchdog: WatchdogKeeper,
    interval: Duration,
    first_tick: bool,
    state: LoopState,
}

impl<Src, Snk, Clk> ControlLoop<Src, Snk, Clk>
where
    Src: SensorSource,
    Snk: ControlSink,
    Clk: Clock,
{
    /// Create an idle control loop
    pub fn new(
        sensors: Src,
        sink: Snk,
        clock: Clk,
        engine: FanDecisionEngine,
        watchdog: WatchdogKeeper,
    ) -> Self {
        Self {
            sensors,
            sink,
            clock,
            engine,
            watchdog,
            interval: TICK_INTERVAL,
            first_tick: true,
            state: LoopState::Idle,
        }
    }

    /// Override the time slept between ticks
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Arm the kernel watchdog and start running
    ///
    /// # Errors
    /// Any failure here happens during the first tick and is fatal
    pub fn start(&mut self) -> Result<()> {
        let now = self.clock.now()?.monotonic;
        self.watchdog.arm(&mut self.engine, &mut self.sink, now)?;
        self.state = LoopState::Running;
        Ok(())
    }

    /// Run one tick: read sensors, decide, keep the watchdog fed
    ///
    /// The watchdog is tended on every tick that did not write a new level,
    /// including ticks whose level write failed.
    ///
    /// # Errors
    /// Sensor and sink failures are returned as-is; the caller decides
    /// whether they are fatal. A failed level write is reported in
    /// preference to a failed refresh.
    pub fn tick(&mut self) -> Result<Decision> {
        let reading = match self.sensors.max_temperature() {
            Ok(temp) => Some(temp),
            Err(e) if self.first_tick => return Err(e.into()),
            Err(e) => {
                log::error!("{}", e);
                None
            }
        };

        let now = self.clock.now()?;
        let decision = self.engine.decide(reading, &mut self.sink, now.monotonic);
        if matches!(decision, Ok(Decision::Set(_))) {
            return decision;
        }

        let refreshed = self
            .watchdog
            .maybe_refresh(&mut self.engine, &mut self.sink, now);
        let decision = decision?;
        refreshed?;
        Ok(decision)
    }

    /// Tick until `shutdown` is set, then restore automatic mode
    ///
    /// `shutdown` is checked before each tick and after each sleep, never
    /// in the middle of a decision.
    ///
    /// # Errors
    /// Returns the first error that is fatal: any error on the first tick,
    /// and configuration or invariant errors at any time
    pub fn run(&mut self, shutdown: &AtomicBool) -> Result<()> {
        if self.state == LoopState::Idle {
            self.start()?;
        }

        while !shutdown.load(Ordering::SeqCst) {
            if let Err(e) = self.tick() {
                self.handle_tick_error(e)?;
            }

            if shutdown.load(Ordering::SeqCst) {
                break;
            }
            thread::sleep(self.interval);
            self.first_tick = false;
        }

        self.stop();
        Ok(())
    }

    fn handle_tick_error(&mut self, err: AppError) -> Result<()> {
        if self.first_tick {
            log::error!("Quitting due to failure during first run");
            self.state = LoopState::Terminated;
            return Err(err);
        }
        if !err.tolerated_after_first_tick() {
            self.state = LoopState::Terminated;
            return Err(err);
        }

        match err.hint() {
            Some(hint) => log::error!("{} ({})", err, hint),
            None => log::error!("{}", err),
        }
        Ok(())
    }

    /// Return the fan to automatic mode and disarm the watchdog
    ///
    /// Best effort: failures are logged and not retried.
    pub fn stop(&mut self) {
        self.state = LoopState::Stopping;
        log::info!("Quit requested, reenabling automatic fan control");

        // Only stamps the final writes; a broken clock must not keep the
        // fan out of automatic mode
        let now = match self.clock.now() {
            Ok(reading) => reading.monotonic,
            Err(e) => {
                log::error!("{}", e);
                Duration::ZERO
            }
        };
        let auto = Command::Level(LevelToken::auto());
        match self.engine.issue(&mut self.sink, &auto, now) {
            Ok(()) => {
                if let Err(e) = self.watchdog.disarm(&mut self.engine, &mut self.sink, now) {
                    log::error!("Failed to disarm watchdog: {}", e);
                }
            }
            Err(e) => log::error!("Failed to restore automatic fan control: {}", e),
        }

        self.state = LoopState::Terminated;
    }

    /// Current lifecycle state
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// The decision engine
    pub fn engine(&self) -> &FanDecisionEngine {
        &self.engine
    }

    /// The control sink
    pub fn sink(&self) -> &Snk {
        &self.sink
    }

    /// The sensor source
    pub fn sensors(&self) -> &Src {
        &self.sensors
    }
}

/// Execute the daemon
pub fn run_control(cli: &Cli) -> Result<()> {
    let config = ConfigFile::load(&cli.config)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))?;

    let fan = TpacpiFan::new(&cli.fan_control);
    let rules = with_full_speed_fallback(config.rule_table()?, fan.supports_full_speed()?);
    let engine = FanDecisionEngine::new(rules, config.temp_hysteresis, DEFAULT_TICK_HYSTERESIS);
    let watchdog = WatchdogKeeper::new(config.watchdog_timeout()?);

    let sensors = HwmonSensors::discover(&cli.hwmon_root, &config.ignore_sensors)?;
    log_thresholds(engine.rules(), sensors.ignored_count());

    let mut control = ControlLoop::new(sensors, fan, SystemClock::new(), engine, watchdog);
    control.run(&shutdown)
}

/// Swap `full-speed` for level 7 on firmware that lacks it
fn with_full_speed_fallback(rules: RuleTable, full_speed_supported: bool) -> RuleTable {
    let uses_full_speed = rules.get(FanLevel::Max).command.as_str() == LevelToken::FULL_SPEED;
    if full_speed_supported || !uses_full_speed {
        return rules;
    }

    log::error!("level \"full-speed\" not supported, using level 7");
    rules.with_command(
        FanLevel::Max,
        LevelToken::new_unchecked(LevelToken::LEVEL_7),
    )
}

fn log_thresholds(rules: &RuleTable, ignored: usize) {
    for rule in rules.rules() {
        if let Some(celsius) = rule.threshold.celsius() {
            log::info!("At {}°C fan is set to {}", celsius, rule.label());
        }
    }
    log::info!("Ignored {} present sensors based on config", ignored);
}
