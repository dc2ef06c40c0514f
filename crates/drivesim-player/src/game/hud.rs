//! HUD overlays drawn on top of the world view
//!
//! Renders:
//! - Status panel (speed, scenario k/N, correct/wrong, session time)
//! - Off-road warning
//! - Question panel while a scenario awaits an answer
//! - Answer feedback until driving resumes
//! - Paused banner and the end-of-session summary
//! - Minimap (separate list, top-right corner)

use crate::engine::font::{self, CHAR_ADVANCE, LINE_HEIGHT};

use super::draw::{palette, DrawList};
use super::{Simulation, Submission};

const MARGIN: f32 = 10.0;
const PANEL_PAD: f32 = 12.0;
const OPTION_KEYS: [&str; 4] = ["1", "2", "3", "4"];

pub fn render(sim: &Simulation, out: &mut DrawList) {
    let (vw, vh) = sim.view_size();

    status_panel(sim, out);

    let v = sim.vehicle();
    if !sim.is_frozen() && !sim.world().is_on_road(v.x, v.y) {
        out.text_centered(vw / 2.0, MARGIN + 4.0, "OFF ROAD - RETURN TO THE STREET", palette::BAD, 2);
    }

    if let Some((summary, metrics)) = sim.result() {
        let mut lines = vec![
            (format!("Correct: {} / {}", summary.correct, summary.total), palette::WHITE),
            (format!("Wrong: {}", summary.wrong), palette::WHITE),
            (format!("Accuracy: {}%", summary.accuracy), palette::HIGHLIGHT),
            (format!("Time: {}s", summary.elapsed_secs), palette::WHITE),
            (format!("Best streak: {}", metrics.longest_correct_streak), palette::TEXT_DIM),
        ];
        if let (Some(fast), Some(slow)) = (metrics.fastest_interval_secs, metrics.slowest_interval_secs) {
            lines.push((format!("Fastest / slowest: {:.1}s / {:.1}s", fast, slow), palette::TEXT_DIM));
        }
        lines.push(submission_line(sim.submission()));
        lines.push(("R: new session   Esc: quit".to_string(), palette::TEXT_DIM));
        centered_panel(out, vw, vh, "SESSION COMPLETE", palette::HIGHLIGHT, &lines);
        return;
    }

    // A paused session keeps its question hidden until play resumes
    if let Some(prompt) = sim.prompt().filter(|_| !sim.is_paused()) {
        let s = &prompt.scenario;
        let width = (vw * 0.7).min(640.0);
        let chars = ((width - PANEL_PAD * 2.0) / CHAR_ADVANCE as f32) as usize;
        let mut lines: Vec<(String, u32)> = font::wrap(&s.question, chars)
            .into_iter()
            .map(|l| (l, palette::WHITE))
            .collect();
        lines.push((String::new(), palette::WHITE));
        for (i, option) in s.options.iter().enumerate() {
            let key = OPTION_KEYS.get(i).copied().unwrap_or("?");
            for (j, line) in font::wrap(option, chars.saturating_sub(4)).into_iter().enumerate() {
                let text = if j == 0 {
                    format!("{}) {}", key, line)
                } else {
                    format!("   {}", line)
                };
                lines.push((text, palette::HIGHLIGHT));
            }
        }
        let title = format!("SCENARIO {}/{}: {}", prompt.position, prompt.total, s.title);
        centered_panel(out, vw, vh, &title, palette::WHITE, &lines);
    } else if let Some(res) = sim.feedback() {
        let width = (vw * 0.7).min(640.0);
        let chars = ((width - PANEL_PAD * 2.0) / CHAR_ADVANCE as f32) as usize;
        let (title, color) = if res.outcome.is_correct {
            ("CORRECT!", palette::GOOD)
        } else {
            ("WRONG", palette::BAD)
        };
        let mut lines: Vec<(String, u32)> = font::wrap(&format!("Answer: {}", res.correct_option), chars)
            .into_iter()
            .map(|l| (l, palette::HIGHLIGHT))
            .collect();
        lines.extend(font::wrap(&res.explanation, chars).into_iter().map(|l| (l, palette::WHITE)));
        centered_panel(out, vw, vh, title, color, &lines);
    }

    if sim.is_paused() {
        out.fill_rect(0.0, vh / 2.0 - 24.0, vw, 48.0, palette::PANEL);
        out.text_centered(vw / 2.0, vh / 2.0 - 7.0, "PAUSED - P TO RESUME", palette::HIGHLIGHT, 2);
    } else if sim.prompt().is_none() && sim.feedback().is_none() {
        out.text(
            MARGIN,
            vh - MARGIN - LINE_HEIGHT as f32,
            "Arrows/WASD: drive   1-4: answer   P: pause   R: restart   Esc: end",
            palette::TEXT_DIM,
        );
    }
}

fn status_panel(sim: &Simulation, out: &mut DrawList) {
    let stats = sim.stats();
    let session = sim.scenarios().session();
    let elapsed = sim.clock().as_secs();
    let lines = [
        format!("SPEED  {} km/h", sim.vehicle().display_speed()),
        format!("SCENARIO  {}/{}", (stats.total() as usize + 1).min(session.len()), session.len()),
        format!("CORRECT {}   WRONG {}", stats.correct(), stats.wrong()),
        format!("TIME  {:02}:{:02}", elapsed / 60, elapsed % 60),
    ];
    let w = 190.0;
    let h = PANEL_PAD * 2.0 + lines.len() as f32 * LINE_HEIGHT as f32;
    out.fill_rect(MARGIN, MARGIN, w, h, palette::PANEL);
    out.stroke_rect(MARGIN, MARGIN, w, h, palette::PANEL_EDGE);
    for (i, line) in lines.iter().enumerate() {
        out.text(
            MARGIN + PANEL_PAD,
            MARGIN + PANEL_PAD + i as f32 * LINE_HEIGHT as f32,
            line.as_str(),
            palette::WHITE,
        );
    }
}

fn submission_line(state: &Submission) -> (String, u32) {
    match state {
        Submission::NotSubmitted => ("Result not submitted".to_string(), palette::TEXT_DIM),
        Submission::Pending => ("Saving result...".to_string(), palette::TEXT_DIM),
        Submission::Delivered(_) => ("Result saved".to_string(), palette::GOOD),
        Submission::Failed(e) => (format!("Could not save result: {}", e), palette::BAD),
    }
}

/// Panel in the middle of the screen: a scale-2 title over body lines
fn centered_panel(out: &mut DrawList, vw: f32, vh: f32, title: &str, title_color: u32, lines: &[(String, u32)]) {
    let title_h = 2.0 * LINE_HEIGHT as f32 + 4.0;
    let widest = lines
        .iter()
        .map(|(l, _)| font::text_width(l))
        .chain(std::iter::once(font::text_width_scaled(title, 2)))
        .max()
        .unwrap_or(0) as f32;
    let w = (widest + PANEL_PAD * 2.0).min(vw - MARGIN * 2.0);
    let h = PANEL_PAD * 2.0 + title_h + lines.len() as f32 * LINE_HEIGHT as f32;
    let x = (vw - w) / 2.0;
    let y = ((vh - h) / 2.0).max(MARGIN);

    out.fill_rect(x, y, w, h, palette::PANEL);
    out.stroke_rect(x, y, w, h, palette::PANEL_EDGE);
    out.stroke_rect(x + 2.0, y + 2.0, w - 4.0, h - 4.0, palette::PANEL_EDGE);
    out.text_centered(vw / 2.0, y + PANEL_PAD, title, title_color, 2);

    let body_y = y + PANEL_PAD + title_h;
    for (i, (line, color)) in lines.iter().enumerate() {
        out.text(x + PANEL_PAD, body_y + i as f32 * LINE_HEIGHT as f32, line.as_str(), *color);
    }
}

/// Whole world at the minimap scale with the vehicle and the camera's view
pub fn render_minimap(sim: &Simulation, out: &mut DrawList) {
    let world = sim.world();
    let scale = sim.config().camera.minimap_scale;
    let (vw, vh) = sim.view_size();
    let ox = vw - world.width * scale - MARGIN;
    let oy = MARGIN;

    world.render_minimap(ox, oy, scale, out);

    let cam = sim.camera();
    out.stroke_rect(ox + cam.x * scale, oy + cam.y * scale, vw * scale, vh * scale, palette::HIGHLIGHT);

    let v = sim.vehicle();
    out.fill_circle(ox + v.x * scale, oy + v.y * scale, 3.0, palette::SIGN_RED);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::catalog::Catalog;
    use crate::game::draw::DrawCmd;
    use crate::game::vehicle::Controls;
    use crate::game::SimEvent;
    use drivesim_common::{SimConfig, TriggerPolicy};
    use drivesim_gateway::MemoryGateway;
    use std::time::Duration;

    fn sim() -> Simulation {
        let mut config = SimConfig::default();
        config.scenarios.seed = Some(77);
        config.scenarios.trigger = TriggerPolicy::DistanceTravelled { interval: 100.0 };
        let mut sim = Simulation::new(config, Catalog::builtin().unwrap(), Box::new(MemoryGateway::new()));
        sim.start();
        sim
    }

    fn texts(list: &DrawList) -> Vec<String> {
        list.cmds()
            .iter()
            .filter_map(|c| match c {
                DrawCmd::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    fn trigger(sim: &mut Simulation) {
        let gas = Controls { accelerate: true, ..Default::default() };
        for _ in 0..1000 {
            let events = sim.tick(Duration::from_millis(16), gas);
            if events.iter().any(|e| matches!(e, SimEvent::ScenarioPresented(_))) {
                return;
            }
        }
        panic!("no scenario triggered");
    }

    #[test]
    fn status_shows_speed_and_progress() {
        let sim = sim();
        let mut list = DrawList::new();
        render(&sim, &mut list);
        let t = texts(&list);
        assert!(t.iter().any(|s| s == "SPEED  0 km/h"));
        assert!(t.iter().any(|s| s == "SCENARIO  1/5"));
    }

    #[test]
    fn question_panel_lists_numbered_options() {
        let mut sim = sim();
        trigger(&mut sim);
        let mut list = DrawList::new();
        render(&sim, &mut list);
        let t = texts(&list);
        let prompt = sim.prompt().unwrap();
        assert!(t.iter().any(|s| s.starts_with("SCENARIO 1/5: ")));
        for key in ["1) ", "2) ", "3) ", "4) "] {
            assert!(t.iter().any(|s| s.starts_with(key)), "missing option {}", key);
        }
        assert!(t.iter().any(|s| prompt.scenario.question.starts_with(s.as_str()) && !s.is_empty()));
    }

    #[test]
    fn feedback_after_answer() {
        let mut sim = sim();
        trigger(&mut sim);
        let correct = sim.prompt().unwrap().scenario.correct;
        sim.answer(correct).unwrap();
        let mut list = DrawList::new();
        render(&sim, &mut list);
        assert!(texts(&list).iter().any(|s| s == "CORRECT!"));
    }

    #[test]
    fn paused_hides_question() {
        let mut sim = sim();
        trigger(&mut sim);
        sim.pause();
        let mut list = DrawList::new();
        render(&sim, &mut list);
        let t = texts(&list);
        assert!(t.iter().any(|s| s == "PAUSED - P TO RESUME"));
        assert!(!t.iter().any(|s| s.starts_with("SCENARIO 1/5: ")));
        assert!(!t.iter().any(|s| s.starts_with("1) ")));
    }

    #[test]
    fn summary_after_end() {
        let mut sim = sim();
        sim.end();
        let mut list = DrawList::new();
        render(&sim, &mut list);
        let t = texts(&list);
        assert!(t.iter().any(|s| s == "SESSION COMPLETE"));
        assert!(t.iter().any(|s| s == "Accuracy: 0%"));
        assert!(t.iter().any(|s| s == "Result saved"));
    }

    #[test]
    fn paused_banner() {
        let mut sim = sim();
        sim.pause();
        let mut list = DrawList::new();
        render(&sim, &mut list);
        assert!(texts(&list).iter().any(|s| s.starts_with("PAUSED")));
    }

    #[test]
    fn minimap_marks_vehicle_and_view() {
        let sim = sim();
        let mut list = DrawList::new();
        render_minimap(&sim, &mut list);
        let scale = sim.config().camera.minimap_scale;
        let (vw, _) = sim.view_size();
        let ox = vw - sim.world().width * scale - MARGIN;
        let v = sim.vehicle();
        let dot = list.cmds().iter().any(|c| match c {
            DrawCmd::FillCircle { cx, cy, .. } => {
                (*cx - (ox + v.x * scale)).abs() < 1e-3 && (*cy - (MARGIN + v.y * scale)).abs() < 1e-3
            }
            _ => false,
        });
        assert!(dot);
        let cam_rect = list.cmds().iter().any(|c| {
            matches!(c, DrawCmd::StrokeRect { color, .. } if *color == palette::HIGHLIGHT)
        });
        assert!(cam_rect);
    }
}
