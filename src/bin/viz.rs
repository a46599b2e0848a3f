use std::collections::VecDeque;

use eframe::egui;
use egui_plot::{Line, Plot, PlotPoints};

use pendulum_pid::clock::SystemClock;
use pendulum_pid::control::GainPreset;
use pendulum_pid::sim::{FrameTimer, Simulation};
use pendulum_pid::AppConfig;

/// Seconds of angle/output history kept on the scope plots.
const SCOPE_SECONDS: f64 = 10.0;
const KICK: f64 = 5.0;

fn main() -> eframe::Result {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .compact()
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => match AppConfig::load(std::path::Path::new(&path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        },
        None => AppConfig::default(),
    };
    let sim = match Simulation::from_config(&config) {
        Ok(sim) => sim,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let app = PendulumViz::new(sim, config.run.max_dt);
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1200.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native("Inverted Pendulum PID", options, Box::new(|_| Ok(Box::new(app))))
}

struct PendulumViz {
    sim: Simulation,
    timer: FrameTimer<SystemClock>,
    paused: bool,
    kp: f64,
    ki: f64,
    kd: f64,
    preset: GainPreset,
    status: String,
    scope: VecDeque<[f64; 3]>, // time, angle deg, output
}

impl PendulumViz {
    fn new(sim: Simulation, max_dt: f64) -> Self {
        let gains = sim.controller().gains();
        Self {
            sim,
            timer: FrameTimer::new(SystemClock::new(), max_dt),
            paused: false,
            kp: gains.kp,
            ki: gains.ki,
            kd: gains.kd,
            preset: GainPreset::Balanced,
            status: String::new(),
            scope: VecDeque::new(),
        }
    }

    fn advance(&mut self) {
        let Some(dt) = self.timer.next_dt() else { return };
        if self.paused {
            return;
        }
        let out = self.sim.tick(dt);
        let t = self.sim.time();
        self.scope.push_back([t, self.sim.state().angle_degrees, out.output]);
        while self.scope.front().is_some_and(|s| t - s[0] > SCOPE_SECONDS) {
            self.scope.pop_front();
        }
    }

    fn sync_gains(&mut self) {
        let g = self.sim.controller().gains();
        self.kp = g.kp;
        self.ki = g.ki;
        self.kd = g.kd;
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.heading("Controller");
        let mut changed = false;
        changed |= ui.add(egui::Slider::new(&mut self.kp, 0.0..=10.0).text("kp")).changed();
        changed |= ui.add(egui::Slider::new(&mut self.ki, 0.0..=2.0).text("ki")).changed();
        changed |= ui.add(egui::Slider::new(&mut self.kd, 0.0..=3.0).text("kd")).changed();
        if changed {
            self.sim.set_gains(self.kp, self.ki, self.kd);
        }

        egui::ComboBox::from_label("Preset")
            .selected_text(self.preset.label())
            .show_ui(ui, |ui| {
                for preset in GainPreset::ALL {
                    ui.selectable_value(&mut self.preset, preset, preset.label());
                }
            });
        if ui.button("Load preset").clicked() {
            let g = self.preset.gains();
            self.sim.set_gains(g.kp, g.ki, g.kd);
            self.sync_gains();
        }

        ui.separator();
        ui.horizontal(|ui| {
            if ui.button("◀ Kick").clicked() {
                self.sim.apply_disturbance(-KICK);
            }
            if ui.button("Kick ▶").clicked() {
                self.sim.apply_disturbance(KICK);
            }
        });
        ui.horizontal(|ui| {
            if ui.button("Reset").clicked() {
                self.sim.reset();
                self.scope.clear();
                self.timer.restart();
            }
            let label = if self.paused { "Resume" } else { "Pause" };
            if ui.button(label).clicked() {
                self.paused = !self.paused;
            }
        });
        if ui.button("Auto-tune").clicked() {
            self.status = match self.sim.auto_tune() {
                Ok(t) => format!("Ku={:.2} Pu={:.2}s", t.ultimate_gain, t.ultimate_period),
                Err(e) => e.to_string(),
            };
            self.sync_gains();
        }
        if !self.status.is_empty() {
            ui.label(&self.status);
        }

        ui.separator();
        ui.heading("Loop");
        let m = self.sim.metrics();
        let s = self.sim.state();
        ui.label(format!("Status:   {}", m.stability));
        ui.label(format!("Angle:    {:>7.2}°", s.angle_degrees));
        ui.label(format!("Output:   {:>7.2}", m.output));
        ui.label(format!("RMS err:  {:>7.2}°", m.rms_error));
        ui.label(format!("Avg err:  {:>7.2}°", m.avg_error));
        ui.label(format!("I term:   {:>7.2}", m.integral));
        ui.label(format!("D term:   {:>7.2}", m.derivative));
        ui.label(format!("Position: {:>7.2} m", s.position));
        ui.label(format!("Time:     {:>7.2} s (dt cap {:.0} ms)", self.sim.time(), self.timer.max_dt() * 1e3));
    }

    fn scene(&self, ui: &mut egui::Ui, width: f32, height: f32) {
        let physics = self.sim.physics();
        let base = physics.state().position;
        let tip = physics.tip_position();
        let rod: PlotPoints = vec![[base, 0.0], [tip.x, tip.y]].into_iter().collect();
        let ground: PlotPoints = vec![[base - 3.0, 0.0], [base + 3.0, 0.0]].into_iter().collect();
        let trail: PlotPoints = physics.trail().iter().map(|p| [p.pos.x, p.pos.y]).collect();

        Plot::new("scene")
            .width(width)
            .height(height)
            .data_aspect(1.0)
            .include_y(-0.2)
            .include_y(physics.params().length * 1.2)
            .show(ui, |plot_ui| {
                plot_ui.line(Line::new("Ground", ground));
                plot_ui.line(Line::new("Trail", trail));
                plot_ui.line(Line::new("Body", rod).width(4.0));
            });
    }

    fn scope_plot(&self, ui: &mut egui::Ui, id: &str, column: usize, width: f32, height: f32) {
        let points: PlotPoints = self.scope.iter().map(|s| [s[0], s[column]]).collect();
        Plot::new(id.to_owned())
            .width(width)
            .height(height)
            .x_axis_label("Time (s)")
            .show(ui, |plot_ui| {
                plot_ui.line(Line::new(id.to_owned(), points));
            });
    }
}

impl eframe::App for PendulumViz {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.advance();

        egui::SidePanel::left("controls").show(ctx, |ui| self.controls(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            let available = ui.available_size();
            let half_w = available.x / 2.0 - 8.0;
            let half_h = available.y / 2.0 - 8.0;

            ui.horizontal(|ui| {
                ui.vertical(|ui| {
                    ui.label("Pendulum");
                    self.scene(ui, half_w, available.y - 24.0);
                });
                ui.vertical(|ui| {
                    ui.label("Angle (deg)");
                    self.scope_plot(ui, "Angle", 1, half_w, half_h - 16.0);
                    ui.label("Control output");
                    self.scope_plot(ui, "Output", 2, half_w, half_h - 16.0);
                });
            });
        });

        ctx.request_repaint();
    }
}
