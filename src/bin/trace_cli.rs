#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = native::run() {
        eprintln!("trace_cli error: {err}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::fmt::Write as _;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use spline_engine::geom::{
        DEFAULT_CONTROL_POINTS, Point3, Sample, SampleBuffer, Vec3,
    };
    use spline_engine::tracer::{
        FollowMode, FollowerConfig, SplineFollower, TickReport, Trigger, TriggerKind, WrapMode,
    };

    const DEFAULT_TICKS: usize = 20;
    const DEFAULT_DT: f64 = 0.1;

    const USAGE: &str = r#"trace_cli (spline-engine)

USAGE:
  trace_cli list
  trace_cli run <scenario|all> [options]

SCENARIOS:
  clamp_line
  loop_circle
  ping_pong_arc
  clipped_loop_window
  optimized_projection

OPTIONS (run):
  --ticks <n>        Number of ticks to simulate (default 20)
  --dt <seconds>     Tick length in seconds (default 0.1)
  -h, --help         Show this help
"#;

    pub fn run() -> Result<(), String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut args = Args::new(args);

        let Some(command) = args.next() else {
            print_usage();
            return Ok(());
        };

        match command.as_str() {
            "list" => {
                print_scenarios();
                Ok(())
            }
            "run" => cmd_run(&mut args),
            "-h" | "--help" | "help" => {
                print_usage();
                Ok(())
            }
            other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
        }
    }

    fn print_usage() {
        println!("{USAGE}");
    }

    fn print_scenarios() {
        for scenario in Scenario::ALL {
            println!("{}", scenario.name());
        }
    }

    fn cmd_run(args: &mut Args) -> Result<(), String> {
        let scenario_name = args.next().ok_or("missing scenario name")?;

        let mut ticks = DEFAULT_TICKS;
        let mut dt = DEFAULT_DT;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--ticks" => {
                    ticks = args
                        .value("--ticks")?
                        .parse()
                        .map_err(|e| format!("invalid --ticks: {e}"))?;
                }
                "--dt" => {
                    dt = args
                        .value("--dt")?
                        .parse()
                        .map_err(|e| format!("invalid --dt: {e}"))?;
                    if !(dt > 0.0) {
                        return Err("--dt must be positive".to_string());
                    }
                }
                "-h" | "--help" => {
                    print_usage();
                    return Ok(());
                }
                other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
            }
        }

        if scenario_name == "all" {
            for scenario in Scenario::ALL {
                print!("{}", run_scenario(*scenario, ticks, dt));
            }
            return Ok(());
        }

        let scenario = Scenario::from_str(scenario_name.as_str())
            .ok_or_else(|| unknown_scenario(&scenario_name))?;
        print!("{}", run_scenario(scenario, ticks, dt));
        Ok(())
    }

    fn unknown_scenario(name: &str) -> String {
        let mut msg = String::new();
        let _ = writeln!(msg, "unknown scenario `{name}`\n\navailable scenarios:");
        for scenario in Scenario::ALL {
            let _ = writeln!(msg, "  {}", scenario.name());
        }
        msg
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Scenario {
        ClampLine,
        LoopCircle,
        PingPongArc,
        ClippedLoopWindow,
        OptimizedProjection,
    }

    impl Scenario {
        const ALL: &'static [Scenario] = &[
            Scenario::ClampLine,
            Scenario::LoopCircle,
            Scenario::PingPongArc,
            Scenario::ClippedLoopWindow,
            Scenario::OptimizedProjection,
        ];

        fn name(self) -> &'static str {
            match self {
                Scenario::ClampLine => "clamp_line",
                Scenario::LoopCircle => "loop_circle",
                Scenario::PingPongArc => "ping_pong_arc",
                Scenario::ClippedLoopWindow => "clipped_loop_window",
                Scenario::OptimizedProjection => "optimized_projection",
            }
        }

        fn from_str(name: &str) -> Option<Self> {
            match name {
                "clamp_line" => Some(Scenario::ClampLine),
                "loop_circle" => Some(Scenario::LoopCircle),
                "ping_pong_arc" => Some(Scenario::PingPongArc),
                "clipped_loop_window" => Some(Scenario::ClippedLoopWindow),
                "optimized_projection" => Some(Scenario::OptimizedProjection),
                _ => None,
            }
        }
    }

    fn run_scenario(scenario: Scenario, ticks: usize, dt: f64) -> String {
        match scenario {
            Scenario::ClampLine => {
                let buffer = line(9, 8.0);
                let follower = SplineFollower::new(FollowerConfig {
                    mode: FollowMode::Uniform,
                    wrap: WrapMode::Clamp,
                    speed: 6.0,
                    ..FollowerConfig::default()
                });
                simulate(scenario, &buffer, follower, ticks, dt)
            }
            Scenario::LoopCircle => {
                let buffer = circle(33, 2.0, 1.0).with_loop_samples(true).with_clip_range(0.0, 0.0);
                let mut follower = SplineFollower::new(FollowerConfig {
                    mode: FollowMode::Uniform,
                    wrap: WrapMode::Loop,
                    speed: 4.0,
                    ..FollowerConfig::default()
                });
                follower.add_trigger(Trigger::new("half", 0.5, TriggerKind::Forward));
                simulate(scenario, &buffer, follower, ticks, dt)
            }
            Scenario::PingPongArc => {
                let buffer = circle(17, 1.5, 0.5);
                let mut follower = SplineFollower::new(FollowerConfig {
                    mode: FollowMode::Parametric,
                    wrap: WrapMode::PingPong,
                    speed: 0.35,
                    ..FollowerConfig::default()
                });
                follower.add_trigger(Trigger::new("apex", 0.5, TriggerKind::Double));
                simulate(scenario, &buffer, follower, ticks, dt)
            }
            Scenario::ClippedLoopWindow => {
                let buffer = circle(33, 2.0, 1.0).with_loop_samples(true).with_clip_range(0.75, 0.25);
                let mut follower = SplineFollower::new(FollowerConfig {
                    mode: FollowMode::Time,
                    wrap: WrapMode::Loop,
                    duration: 0.8,
                    auto_start: true,
                    ..FollowerConfig::default()
                });
                follower.set_anchor(Some(Point3::new(2.5, 0.1, 0.0)));
                follower.add_trigger(Trigger::new("seam", 0.5, TriggerKind::Double));
                simulate(scenario, &buffer, follower, ticks, dt)
            }
            Scenario::OptimizedProjection => optimized_projection(),
        }
    }

    fn simulate(
        scenario: Scenario,
        buffer: &SampleBuffer,
        mut follower: SplineFollower,
        ticks: usize,
        dt: f64,
    ) -> String {
        let ends = Arc::new(AtomicUsize::new(0));
        let beginnings = Arc::new(AtomicUsize::new(0));
        let hits = Arc::new(AtomicUsize::new(0));
        {
            let ends = Arc::clone(&ends);
            follower.on_end_reached(move || {
                ends.fetch_add(1, Ordering::Relaxed);
            });
            let beginnings = Arc::clone(&beginnings);
            follower.on_beginning_reached(move || {
                beginnings.fetch_add(1, Ordering::Relaxed);
            });
            let hits = Arc::clone(&hits);
            follower.on_trigger(move |_| {
                hits.fetch_add(1, Ordering::Relaxed);
            });
        }

        let mut out = String::new();
        let _ = writeln!(out, "# {} | {}", scenario.name(), buffer.diagnostics().summary());
        let _ = writeln!(
            out,
            "# length={:.4} span={:.4} looped={}",
            buffer.length(),
            buffer.span(),
            buffer.is_looped()
        );
        for tick in 0..ticks {
            let report = follower.update(buffer, dt);
            let _ = writeln!(out, "{}", format_tick(tick, &report));
        }
        let _ = writeln!(
            out,
            "# end_reached={} beginning_reached={} triggers={}",
            ends.load(Ordering::Relaxed),
            beginnings.load(Ordering::Relaxed),
            hits.load(Ordering::Relaxed)
        );
        if let Some(report) = follower.timing_report() {
            let _ = writeln!(out, "# timing: {:.3} ms over {} ticks", report.total_ms(), report.calls);
        }
        out
    }

    fn format_tick(tick: usize, report: &TickReport) -> String {
        let p = report.sample.position;
        let mut line = format!(
            "{tick:>4} local={:.4} global={:.4} pos=({:.3}, {:.3}, {:.3}) dir={:?}",
            report.percent, report.sample.percent, p.x, p.y, p.z, report.direction
        );
        if report.end_reached {
            line.push_str(" [end]");
        }
        if report.beginning_reached {
            line.push_str(" [beginning]");
        }
        for hit in &report.triggers {
            let _ = write!(line, " [trigger {} {:?}]", hit.name, hit.direction);
        }
        line
    }

    fn optimized_projection() -> String {
        // Samples bunch up where the curve bends; the table spreads lookups evenly.
        let percents: [f64; 7] = [0.0, 0.05, 0.1, 0.15, 0.2, 0.6, 1.0];
        let samples = percents
            .iter()
            .map(|&p| {
                let bend = if p <= 0.2 { (p * 10.0).sin() } else { 2.0_f64.sin() };
                Sample::new(Point3::new(10.0 * p, bend, 0.0), p)
            })
            .collect();
        let mut out = String::new();
        let buffer = match SampleBuffer::new(samples).and_then(|b| b.with_optimized_indices(vec![0, 4, 5, 6])) {
            Ok(buffer) => buffer,
            Err(err) => {
                let _ = writeln!(out, "# optimized_projection: {err}");
                return out;
            }
        };
        let _ = writeln!(out, "# optimized_projection | {}", buffer.diagnostics().summary());
        let queries = [
            Point3::new(0.5, 0.8, 0.0),
            Point3::new(1.7, 1.2, 0.0),
            Point3::new(4.0, 0.5, 0.0),
            Point3::new(9.5, 1.0, 0.0),
        ];
        for (query, sample) in queries.iter().zip(buffer.project_many(&queries, DEFAULT_CONTROL_POINTS)) {
            let back = buffer.evaluate(buffer.clip_percent(sample.percent));
            let _ = writeln!(
                out,
                "query=({:.2}, {:.2}) percent={:.4} pos=({:.3}, {:.3}) eval_err={:.2e}",
                query.x,
                query.y,
                sample.percent,
                sample.position.x,
                sample.position.y,
                back.position.distance_to(sample.position)
            );
        }
        out
    }

    fn line(count: usize, length: f64) -> SampleBuffer {
        let last = (count - 1) as f64;
        let samples = (0..count)
            .map(|i| {
                let t = i as f64 / last;
                Sample::new(Point3::new(t * length, 0.0, 0.0), t).with_frame(Vec3::X, Vec3::Z)
            })
            .collect();
        SampleBuffer::new(samples).unwrap_or_default()
    }

    /// Arc of `turns` full turns in the XY plane, closed when `turns` is 1.
    fn circle(count: usize, radius: f64, turns: f64) -> SampleBuffer {
        let last = (count - 1) as f64;
        let samples = (0..count)
            .map(|i| {
                let t = i as f64 / last;
                let angle = t * turns * std::f64::consts::TAU;
                let (sin, cos) = angle.sin_cos();
                Sample::new(Point3::new(radius * cos, radius * sin, 0.0), t)
                    .with_frame(Vec3::new(-sin, cos, 0.0), Vec3::Z)
            })
            .collect();
        SampleBuffer::new(samples).unwrap_or_default()
    }

    struct Args {
        args: Vec<String>,
        pos: usize,
    }

    impl Args {
        fn new(args: Vec<String>) -> Self {
            Self { args, pos: 0 }
        }

        fn next(&mut self) -> Option<String> {
            let arg = self.args.get(self.pos)?.clone();
            self.pos += 1;
            Some(arg)
        }

        fn value(&mut self, flag: &str) -> Result<String, String> {
            self.next()
                .ok_or_else(|| format!("missing value for {flag}"))
        }
    }
}
