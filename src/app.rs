//! Browser wiring: canvas, DOM controls, keyboard input and the frame loop.
//!
//! All state lives in one thread-local [`App`]. The animation frame callback and
//! the DOM event closures borrow it in turn; they interleave but never overlap.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlInputElement, HtmlSelectElement,
    window,
};

use crate::audio::WebAudioSink;
use crate::chart::Lane;
use crate::clock::FrameTimer;
use crate::render;
use crate::session::Session;
use crate::settings::{Difficulty, GameConfig};

const CANVAS_ID: &str = "game";
const CANVAS_W: u32 = 320;
const CANVAS_H: u32 = 240;

struct App {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    session: Session,
    audio: Option<WebAudioSink>,
    frame: FrameTimer,
    loop_running: bool,
}

impl App {
    /// One animation frame. Returns whether the loop should keep going.
    fn frame_tick(&mut self, ts: f64) -> bool {
        let dt = self.frame.delta(ts);
        match self.audio.as_mut() {
            Some(audio) => self.session.tick(dt, audio),
            None => self.session.tick(dt, &mut crate::audio::SilentSink),
        };
        self.draw();
        update_hud(&self.session);
        self.loop_running = self.session.is_running();
        self.loop_running
    }

    fn draw(&self) {
        let w = self.canvas.width() as f64;
        let h = self.canvas.height() as f64;
        if let Err(e) = render::draw(&self.ctx, w, h, &self.session) {
            log::debug!("draw failed: {e:?}");
        }
    }
}

thread_local! {
    static APP: RefCell<Option<App>> = const { RefCell::new(None) };
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

fn document() -> Result<Document, JsValue> {
    window()
        .ok_or_else(|| JsValue::from_str("no window"))?
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))
}

fn now_ms() -> f64 {
    window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

/// Initial config from the page's `#bpm` slider and `#difficulty` select, if any.
fn config_from_dom(doc: &Document) -> GameConfig {
    let mut cfg = GameConfig::default();
    if let Some(bpm) = doc
        .get_element_by_id("bpm")
        .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        .and_then(|input| input.value().parse::<f64>().ok())
    {
        cfg.bpm = bpm;
    }
    if let Some(d) = doc
        .get_element_by_id("difficulty")
        .and_then(|el| el.dyn_into::<HtmlSelectElement>().ok())
        .and_then(|sel| sel.value().parse::<Difficulty>().ok())
    {
        cfg.difficulty = d;
    }
    cfg
}

fn ensure_app(config: Option<GameConfig>) -> Result<(), JsValue> {
    let exists = APP.with(|cell| cell.borrow().is_some());
    if exists {
        if let Some(cfg) = config {
            APP.with(|cell| {
                if let Some(app) = cell.borrow_mut().as_mut() {
                    app.session.set_bpm(cfg.bpm);
                    app.session.set_difficulty(cfg.difficulty);
                }
            });
        }
        return Ok(());
    }

    let doc = document()?;
    let canvas: HtmlCanvasElement = if let Some(el) = doc.get_element_by_id(CANVAS_ID) {
        el.dyn_into()?
    } else {
        let c: HtmlCanvasElement = doc.create_element("canvas")?.dyn_into()?;
        c.set_id(CANVAS_ID);
        c.set_width(CANVAS_W);
        c.set_height(CANVAS_H);
        c.set_attribute("style", "image-rendering:pixelated; width:640px; height:480px;")
            .ok();
        doc.body()
            .ok_or_else(|| JsValue::from_str("no body"))?
            .append_child(&c)?;
        c
    };
    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("no 2d context"))?
        .dyn_into()?;
    ctx.set_image_smoothing_enabled(false);

    let config = config.unwrap_or_else(|| config_from_dom(&doc));
    let app = App {
        canvas,
        ctx,
        session: Session::new(config),
        audio: None,
        frame: FrameTimer::new(),
        loop_running: false,
    };
    app.draw();
    APP.with(|cell| cell.replace(Some(app)));
    install_listeners(&doc)?;
    Ok(())
}

fn install_listeners(doc: &Document) -> Result<(), JsValue> {
    // Arrow keys -> lanes
    {
        let closure = Closure::wrap(Box::new(move |evt: web_sys::KeyboardEvent| {
            if let Some(lane) = Lane::from_key(&evt.key()) {
                if press(lane).is_some() {
                    evt.prevent_default();
                }
            }
        }) as Box<dyn FnMut(_)>);
        doc.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    if let Some(btn) = doc.get_element_by_id("start") {
        let closure = Closure::wrap(Box::new(move |_evt: web_sys::MouseEvent| {
            if let Err(e) = start_game() {
                log::warn!("start failed: {e:?}");
            }
        }) as Box<dyn FnMut(_)>);
        btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    if let Some(btn) = doc.get_element_by_id("stop") {
        let closure = Closure::wrap(Box::new(move |_evt: web_sys::MouseEvent| {
            stop_game();
        }) as Box<dyn FnMut(_)>);
        btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    if let Some(el) = doc.get_element_by_id("bpm") {
        let input: HtmlInputElement = el.dyn_into()?;
        let source = input.clone();
        let closure = Closure::wrap(Box::new(move |_evt: web_sys::Event| {
            if let Ok(bpm) = source.value().parse::<f64>() {
                set_bpm(bpm);
            }
        }) as Box<dyn FnMut(_)>);
        input.add_event_listener_with_callback("input", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    if let Some(el) = doc.get_element_by_id("difficulty") {
        let select: HtmlSelectElement = el.dyn_into()?;
        let source = select.clone();
        let closure = Closure::wrap(Box::new(move |_evt: web_sys::Event| {
            if let Err(e) = set_difficulty(&source.value()) {
                log::warn!("{e:?}");
            }
        }) as Box<dyn FnMut(_)>);
        select.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    Ok(())
}

fn start_loop() {
    let f: FrameCallback = Rc::new(RefCell::new(None));
    let g = f.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |ts: f64| {
        let keep_going = APP.with(|cell| match cell.borrow_mut().as_mut() {
            Some(app) => app.frame_tick(ts),
            None => false,
        });
        if !keep_going {
            return;
        }
        if let (Some(w), Some(cb)) = (window(), f.borrow().as_ref()) {
            let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
        }
    }) as Box<dyn FnMut(f64)>));
    if let (Some(w), Some(cb)) = (window(), g.borrow().as_ref()) {
        let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
    }
}

fn update_hud(session: &Session) {
    let Some(doc) = window().and_then(|w| w.document()) else {
        return;
    };
    let sb = session.scoreboard();
    let fields = [
        ("score", format!("Score: {}", sb.score)),
        ("combo", format!("Combo: {}", sb.combo)),
        ("health", format!("Health: {}", sb.health)),
    ];
    for (id, text) in fields {
        if let Some(el) = doc.get_element_by_id(id) {
            el.set_text_content(Some(&text));
        }
    }
}

fn press(lane: Lane) -> Option<crate::judge::Judgment> {
    APP.with(|cell| {
        let mut guard = cell.borrow_mut();
        let app = guard.as_mut()?;
        let judgment = match app.audio.as_mut() {
            Some(audio) => app.session.press_lane(lane, audio),
            None => app.session.press_lane(lane, &mut crate::audio::SilentSink),
        };
        update_hud(&app.session);
        judgment
    })
}

fn begin(config: Option<GameConfig>) -> Result<(), JsValue> {
    ensure_app(config)?;
    let needs_loop = APP.with(|cell| {
        let mut guard = cell.borrow_mut();
        let Some(app) = guard.as_mut() else {
            return false;
        };
        if app.session.is_running() {
            return false;
        }
        // The AudioContext must be created from a user gesture, so it is made lazily here.
        let audio = app.audio.get_or_insert_with(WebAudioSink::new);
        audio.anchor();
        app.session.start(&*audio);
        app.frame.reset(now_ms());
        update_hud(&app.session);
        let start = !app.loop_running;
        app.loop_running = true;
        start
    });
    if needs_loop {
        start_loop();
    }
    Ok(())
}

/// Starts a session using the page's controls (or defaults).
#[wasm_bindgen]
pub fn start_game() -> Result<(), JsValue> {
    begin(None)
}

/// Starts a session from a JSON `GameConfig`, e.g. `{"difficulty":"hard","bpm":140}`.
#[cfg(feature = "serde_json")]
#[wasm_bindgen]
pub fn start_game_with_config(json: &str) -> Result<(), JsValue> {
    let config = GameConfig::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    begin(Some(config))
}

#[wasm_bindgen]
pub fn stop_game() {
    APP.with(|cell| {
        if let Some(app) = cell.borrow_mut().as_mut() {
            app.session.stop();
        }
    });
}

/// Presses a lane by name. Returns true when the press matched a note.
#[wasm_bindgen]
pub fn press_lane(name: &str) -> bool {
    match name.parse::<Lane>() {
        Ok(lane) => press(lane).is_some_and(|j| j.note.is_some()),
        Err(e) => {
            log::warn!("{e}");
            false
        }
    }
}

#[wasm_bindgen]
pub fn set_bpm(bpm: f64) {
    APP.with(|cell| {
        if let Some(app) = cell.borrow_mut().as_mut() {
            app.session.set_bpm(bpm);
        }
    });
}

#[wasm_bindgen]
pub fn set_difficulty(name: &str) -> Result<(), JsValue> {
    let difficulty: Difficulty = name
        .parse()
        .map_err(|e: crate::settings::ParseDifficultyError| JsValue::from_str(&e.to_string()))?;
    APP.with(|cell| {
        if let Some(app) = cell.borrow_mut().as_mut() {
            app.session.set_difficulty(difficulty);
        }
    });
    Ok(())
}
