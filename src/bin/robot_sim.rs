use clap::{App, Arg};
use colored::*;
use robocmd::hal::{ManualClock, SimMotor, SimOperator};
use robocmd::robot::{Robot, RobotDrivers};
use robocmd::RobotConfig;
use std::rc::Rc;
use std::time::Duration;
use tokio::time;
use tracing::{info, warn};

const DEFAULT_TICKS: &str = "2000";
const DEFAULT_SHOT_EVERY: &str = "250";
/// Steady-state rpm per unit output of the simulated drive motors.
const WHEEL_GAIN: f32 = 0.2;

/// Scripted fault window, in ticks.
#[derive(Debug, Clone, Copy)]
struct Window {
    start: u64,
    length: u64,
}

impl Window {
    fn contains(&self, tick: u64) -> bool {
        tick >= self.start && tick < self.start + self.length
    }
}

fn parse_u64(value: String) -> Result<(), String> {
    value
        .parse::<u64>()
        .map(|_| ())
        .map_err(|_| "Value must be a non-negative integer".to_string())
}

fn window(start: Option<&str>, length: Option<&str>) -> Option<Window> {
    let start = start?.parse().ok()?;
    let length = length.and_then(|l| l.parse().ok()).unwrap_or(50);
    Some(Window { start, length })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let matches = App::new("robot-sim")
        .version("0.1.0")
        .author("Robot Controls Team")
        .about("Runs the robot control loop against simulated motors")
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .help("JSON robot configuration")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("ticks")
                .short("n")
                .long("ticks")
                .value_name("N")
                .help("Number of control ticks to run")
                .takes_value(true)
                .default_value(DEFAULT_TICKS)
                .validator(parse_u64),
        )
        .arg(
            Arg::with_name("shot-every")
                .long("shot-every")
                .value_name("N")
                .help("Request a shot every N ticks (0 disables)")
                .takes_value(true)
                .default_value(DEFAULT_SHOT_EVERY)
                .validator(parse_u64),
        )
        .arg(
            Arg::with_name("jam-at")
                .long("jam-at")
                .value_name("TICK")
                .help("Jam the agitator starting at this tick")
                .takes_value(true)
                .validator(parse_u64),
        )
        .arg(
            Arg::with_name("jam-for")
                .long("jam-for")
                .value_name("TICKS")
                .help("How long the jam lasts")
                .takes_value(true)
                .validator(parse_u64),
        )
        .arg(
            Arg::with_name("offline-at")
                .long("offline-at")
                .value_name("TICK")
                .help("Disconnect the agitator motor starting at this tick")
                .takes_value(true)
                .validator(parse_u64),
        )
        .arg(
            Arg::with_name("offline-for")
                .long("offline-for")
                .value_name("TICKS")
                .help("How long the motor stays disconnected")
                .takes_value(true)
                .validator(parse_u64),
        )
        .arg(
            Arg::with_name("drive")
                .long("drive")
                .value_name("LEFT,RIGHT")
                .help("Constant tank-drive stick inputs in [-1, 1]")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("realtime")
                .long("realtime")
                .help("Pace ticks at the configured loop period"),
        )
        .arg(
            Arg::with_name("format")
                .short("f")
                .long("format")
                .value_name("FORMAT")
                .help("Summary output format")
                .takes_value(true)
                .possible_values(&["json", "table"])
                .default_value("table"),
        )
        .get_matches();

    let config = match matches.value_of("config") {
        Some(path) => RobotConfig::load(path)?,
        None => RobotConfig::default(),
    };
    let ticks: u64 = matches.value_of("ticks").unwrap_or(DEFAULT_TICKS).parse()?;
    let shot_every: u64 = matches.value_of("shot-every").unwrap_or(DEFAULT_SHOT_EVERY).parse()?;
    let jam = window(matches.value_of("jam-at"), matches.value_of("jam-for"));
    let offline = window(matches.value_of("offline-at"), matches.value_of("offline-for"));

    let operator = SimOperator::new();
    if let Some(drive) = matches.value_of("drive") {
        let mut parts = drive.split(',').map(str::trim).map(str::parse::<f32>);
        match (parts.next(), parts.next()) {
            (Some(Ok(left)), Some(Ok(right))) => operator.set_tank_inputs(left, right),
            _ => warn!(drive, "ignoring malformed --drive value"),
        }
    }

    let clock = Rc::new(ManualClock::new(0));
    let agitator_motor = SimMotor::new();
    let wheels = [
        SimMotor::with_gain(WHEEL_GAIN),
        SimMotor::with_gain(WHEEL_GAIN),
        SimMotor::with_gain(WHEEL_GAIN),
        SimMotor::with_gain(WHEEL_GAIN),
    ];

    let mut robot = Robot::new(
        &config,
        RobotDrivers {
            clock: clock.clone(),
            agitator_motor: Box::new(agitator_motor.clone()),
            chassis_motors: [
                Box::new(wheels[0].clone()),
                Box::new(wheels[1].clone()),
                Box::new(wheels[2].clone()),
                Box::new(wheels[3].clone()),
            ],
            operator: Rc::new(operator.clone()),
        },
    )?;
    robot.start();

    let period = config.loop_period_ms;
    let mut interval = time::interval(Duration::from_millis(u64::from(period)));
    let realtime = matches.is_present("realtime");

    for tick in 1..=ticks {
        if realtime {
            interval.tick().await;
        }

        clock.advance(period);
        agitator_motor.set_jammed(jam.map_or(false, |w| w.contains(tick)));
        agitator_motor.set_online(!offline.map_or(false, |w| w.contains(tick)));
        agitator_motor.step(period);
        for wheel in &wheels {
            wheel.step(period);
        }

        robot.update();

        if shot_every > 0 && tick % shot_every == 0 && !robot.is_shooting() {
            // Rejections are counted in the robot state and reported in the summary.
            match robot.request_shot() {
                Ok(()) => info!(tick, "shot requested"),
                Err(error) => info!(tick, %error, "scheduled shot skipped"),
            }
        }
    }

    robot.stop();
    info!(ticks, "simulation finished");

    match matches.value_of("format") {
        Some("json") => {
            let summary = serde_json::json!({
                "state": robot.get_state(),
                "scheduler": robot.stats(),
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        _ => print_summary(&robot),
    }

    Ok(())
}

fn print_summary(robot: &Robot) {
    let state = robot.get_state();
    let stats = robot.stats();
    let flag = |ok: bool| if ok { "yes".green() } else { "no".red() };

    println!("{}", "Robot Simulation Summary".bold().blue());
    println!("{}", "========================".blue());
    println!("  Ticks:               {}", stats.ticks);
    println!("  Shots requested:     {}", state.shots_requested);
    println!("  Shots rejected:      {}", state.shots_rejected);
    println!("  Admissions:          {}", stats.total_admitted);
    println!("  Default admissions:  {}", stats.total_default_admissions);
    println!("  Completions:         {}", stats.total_completed);
    println!("  Interruptions:       {}", stats.total_interrupted);
    println!("  Rejections:          {}", stats.total_rejected);
    println!("  Agitator online:     {}", flag(state.agitator_online));
    println!("  Agitator calibrated: {}", flag(state.agitator_calibrated));
    let jammed = if state.agitator_jammed { "yes".red() } else { "no".green() };
    println!("  Agitator jammed:     {}", jammed);
    println!("  Agitator integral:   {:.3} rad", state.agitator_integral);
}
