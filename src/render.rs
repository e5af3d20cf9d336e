//! Canvas drawing for the 320x240 Genesis-style stage.
//!
//! Pure presentation: reads a [`Session`] and paints it, never mutates game state.

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use crate::cast::Actor;
use crate::chart::{LANES, Lane};
use crate::judge::Tier;
use crate::session::{Session, SessionState};

mod palette {
    pub const BG: &str = "#07101a";
    pub const NOTE: &str = "#ffd400";
    pub const NOTE_GLINT: &str = "#ffffff55";
    pub const NOTE_HIT: &str = "#00ff88";
    pub const MISS: &str = "#ff3d3d";
    pub const TEXT: &str = "#cfe7ff";
    pub const LANE: &str = "#112f45";
    pub const TARGET: &str = "#89c7ff";
    pub const FLOOR: &str = "#2b5134";
    pub const SONIC_BLUE: &str = "#0060bb";
    pub const TAILS_ORANGE: &str = "#ffb14d";
    pub const KNUCKLES_RED: &str = "#c8102e";
    pub const AMY_PINK: &str = "#ff6fb5";
    pub const FLESH: &str = "#ffe2b0";
    pub const SHOE_RED: &str = "#d32f2f";
    pub const GLOVE: &str = "#f4f4f4";
}

// Sprite maps: one char per pixel, '.' transparent.
const HEDGEHOG_SPRITE: [&str; 15] = [
    "....bbbbbb....",
    "...bbrrrrbb...",
    "..bbrrrrrrbb..",
    ".bbrrrrrrrrbb.",
    ".bbrfffffrrbb.",
    "bbrfffffffrrbb",
    "bbrfffffffrrbb",
    "bbrfffffffrrbb",
    ".bbrfffffrrbb.",
    "..bbrrrrrrbb..",
    "...bbrrbb.....",
    "....bbbb......",
    "....b..b......",
    "...sss..sss...",
    "..ssg....gss..",
];

const FOX_SPRITE: [&str; 11] = [
    "....ooo.....",
    "...ooooo....",
    "..oooffoo...",
    ".ooffffffo..",
    ".ooffffffo..",
    ".oooffffoo..",
    "..oooffoo...",
    "...oo.oo....",
    "....oo......",
    "...sss......",
    "..ssooss....",
];

struct Sprite {
    map: &'static [&'static str],
    body: &'static str,
    scale: f64,
    x: f64,
    y: f64,
}

fn sprite_for(actor: Actor, w: f64, h: f64) -> Sprite {
    match actor {
        Actor::Sonic => Sprite {
            map: &HEDGEHOG_SPRITE,
            body: palette::SONIC_BLUE,
            scale: 1.5,
            x: w * 0.9,
            y: h * 0.34,
        },
        Actor::Tails => Sprite {
            map: &FOX_SPRITE,
            body: palette::TAILS_ORANGE,
            scale: 1.2,
            x: w * 0.9,
            y: h * 0.58,
        },
        Actor::Knuckles => Sprite {
            map: &HEDGEHOG_SPRITE,
            body: palette::KNUCKLES_RED,
            scale: 1.3,
            x: w * 0.08,
            y: h * 0.34,
        },
        Actor::Amy => Sprite {
            map: &HEDGEHOG_SPRITE,
            body: palette::AMY_PINK,
            scale: 1.2,
            x: w * 0.08,
            y: h * 0.58,
        },
    }
}

fn pixel_color(key: char, body: &'static str) -> Option<&'static str> {
    match key {
        'b' | 'o' => Some(body),
        'r' | 'f' => Some(palette::FLESH),
        's' => Some(palette::SHOE_RED),
        'g' => Some(palette::GLOVE),
        _ => None,
    }
}

pub fn lane_x(lane: Lane, width: f64) -> f64 {
    width * (0.2 + 0.2 * lane.index() as f64)
}

pub fn target_y(height: f64) -> f64 {
    height * 0.75
}

pub fn draw(
    ctx: &CanvasRenderingContext2d,
    w: f64,
    h: f64,
    session: &Session,
) -> Result<(), JsValue> {
    let ty = target_y(h);
    ctx.set_fill_style_str(palette::BG);
    ctx.fill_rect(0.0, 0.0, w, h);
    ctx.set_fill_style_str(palette::FLOOR);
    ctx.fill_rect(0.0, ty + 18.0, w, h - (ty + 18.0));

    draw_lanes(ctx, w, ty)?;
    draw_notes(ctx, w, ty, session);
    draw_feedback(ctx, w, ty, session)?;
    draw_cast(ctx, w, h, session)?;
    draw_hud(ctx, w, h, session)?;
    Ok(())
}

fn draw_lanes(ctx: &CanvasRenderingContext2d, w: f64, ty: f64) -> Result<(), JsValue> {
    ctx.set_font("12px monospace");
    for lane in LANES {
        let x = lane_x(lane, w);
        ctx.set_fill_style_str(palette::LANE);
        ctx.fill_rect(x - 14.0, 0.0, 28.0, ty + 12.0);
        ctx.set_stroke_style_str(palette::TARGET);
        ctx.set_line_width(2.0);
        ctx.stroke_rect(x - 12.0, ty - 12.0, 24.0, 24.0);
        ctx.set_fill_style_str(palette::NOTE);
        let label = lane.name()[..1].to_ascii_uppercase();
        ctx.fill_text(&label, x - 4.0, ty + 4.0)?;
    }
    Ok(())
}

fn draw_notes(ctx: &CanvasRenderingContext2d, w: f64, ty: f64, session: &Session) {
    for view in session.active_notes() {
        let x = lane_x(view.lane, w);
        let y = view.progress * ty;
        let size = 16.0 - (view.progress - 0.5).abs() * 8.0;
        ctx.set_fill_style_str(palette::NOTE);
        ctx.fill_rect(x - size / 2.0, y - size / 2.0, size, size);
        ctx.set_fill_style_str(palette::NOTE_GLINT);
        ctx.fill_rect(x - size / 6.0, y - size / 2.6, size / 3.0, size / 3.0);
    }
}

fn draw_feedback(
    ctx: &CanvasRenderingContext2d,
    w: f64,
    ty: f64,
    session: &Session,
) -> Result<(), JsValue> {
    ctx.set_font("10px monospace");
    for fx in session.feedback() {
        let a = fx.alpha();
        let x = lane_x(fx.lane, w);
        let (color, rise, radius) = match fx.tier {
            Tier::Miss | Tier::Bad => (palette::MISS, 20.0, 10.0),
            _ => (palette::NOTE_HIT, 30.0, 14.0),
        };
        let y = ty - 10.0 - fx.age * rise;
        ctx.set_global_alpha(a);
        ctx.set_fill_style_str(color);
        ctx.begin_path();
        ctx.arc(x, y, radius * (1.0 - a), 0.0, std::f64::consts::TAU)?;
        ctx.fill();
        ctx.fill_text(fx.tier.tag(), x - 10.0, y - 12.0)?;
        ctx.set_global_alpha(1.0);
    }
    Ok(())
}

fn draw_sprite(ctx: &CanvasRenderingContext2d, sprite: &Sprite, dx: f64, dy: f64) {
    let px = 2.0 * sprite.scale;
    let rows = sprite.map.len() as f64;
    let cols = sprite.map.first().map(|r| r.len()).unwrap_or(0) as f64;
    let start_x = (sprite.x + dx - cols * px / 2.0).round();
    let start_y = (sprite.y + dy - rows * px / 2.0).round();
    for (y, row) in sprite.map.iter().enumerate() {
        for (x, key) in row.chars().enumerate() {
            if let Some(color) = pixel_color(key, sprite.body) {
                ctx.set_fill_style_str(color);
                ctx.fill_rect(start_x + x as f64 * px, start_y + y as f64 * px, px, px);
            }
        }
    }
}

fn draw_cast(
    ctx: &CanvasRenderingContext2d,
    w: f64,
    h: f64,
    session: &Session,
) -> Result<(), JsValue> {
    let cast = session.cast();
    for actor in Actor::ALL {
        let st = cast.get(actor);
        if !st.active {
            continue;
        }
        let sprite = sprite_for(actor, w, h);
        // Slide in from the nearest edge during the entrance.
        let from_left = sprite.x < w / 2.0;
        let slide = st.entrance_timer * 40.0 * if from_left { -1.0 } else { 1.0 };
        let bob = -st.anim;
        draw_sprite(ctx, &sprite, slide, bob);
        if st.taunting() {
            ctx.set_fill_style_str(palette::NOTE);
            ctx.set_font("12px monospace");
            ctx.fill_text("!", sprite.x + slide - 2.0, sprite.y - 20.0)?;
        }
    }
    if cast.finale {
        ctx.set_fill_style_str(palette::NOTE);
        ctx.set_font("12px monospace");
        ctx.fill_text("FINALE!", w / 2.0 - 24.0, 16.0)?;
    }
    Ok(())
}

fn draw_hud(
    ctx: &CanvasRenderingContext2d,
    w: f64,
    h: f64,
    session: &Session,
) -> Result<(), JsValue> {
    let sb = session.scoreboard();
    ctx.set_fill_style_str(palette::TEXT);
    ctx.set_font("12px monospace");
    ctx.fill_text(&format!("Score: {}", sb.score), 8.0, 16.0)?;
    ctx.fill_text(&format!("Combo: {}", sb.combo), 8.0, 30.0)?;
    ctx.fill_text(&format!("BPM: {}", session.song_bpm()), 8.0, 44.0)?;

    // health bar
    ctx.set_stroke_style_str(palette::TEXT);
    ctx.stroke_rect(w - 108.0, 8.0, 100.0, 8.0);
    ctx.set_fill_style_str(if sb.health > 30 { palette::NOTE_HIT } else { palette::MISS });
    ctx.fill_rect(w - 108.0, 8.0, sb.health as f64, 8.0);

    let banner = match session.state() {
        SessionState::Lost => Some("YOU LOST! Health depleted."),
        SessionState::Cleared => Some("CLEAR!"),
        _ => None,
    };
    if let Some(text) = banner {
        ctx.set_fill_style_str("rgba(0,0,0,0.55)");
        ctx.fill_rect(0.0, 0.0, w, h);
        ctx.set_fill_style_str("#ffffff");
        ctx.set_font("16px monospace");
        ctx.set_text_align("center");
        ctx.fill_text(text, w / 2.0, h / 2.0)?;
        ctx.set_font("10px monospace");
        ctx.fill_text(
            &format!("Score {}  Max combo {}  Hit {:.0}%", sb.score, sb.max_combo, sb.hit_rate()),
            w / 2.0,
            h / 2.0 + 18.0,
        )?;
        ctx.set_text_align("start");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lane_layout() {
        assert!((lane_x(Lane::Left, 320.0) - 64.0).abs() < 1e-9);
        assert!((lane_x(Lane::Right, 320.0) - 256.0).abs() < 1e-9);
        assert_eq!(target_y(240.0), 180.0);
    }

    #[test]
    fn test_sprite_palette_keys() {
        for row in HEDGEHOG_SPRITE.iter().chain(FOX_SPRITE.iter()) {
            for key in row.chars() {
                assert!(
                    key == '.' || pixel_color(key, palette::SONIC_BLUE).is_some(),
                    "unmapped '{key}'"
                );
            }
        }
    }
}
