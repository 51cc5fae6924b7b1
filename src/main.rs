//! Chorus King entry point
//!
//! Browser: wires DOM events, gamepad polling and the frame loop to
//! `ChorusKing`. Native: runs attract mode headless.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod web_shell {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Gamepad, GamepadButton, KeyboardEvent};

    use chorus_king::game::CONTAINER_ID;
    use chorus_king::input::{GamepadState, KeyboardState, Vibration};
    use chorus_king::level::LEVEL_LIST;
    use chorus_king::sim::GamePhase;
    use chorus_king::{ChorusKing, ContainerHandle, InitError, Mode, platform};

    /// Game plus the device snapshots the shell maintains
    struct Shell {
        game: ChorusKing,
        keyboard: KeyboardState,
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Chorus King starting...");

        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        let container = measure_container(&document);
        let seed = js_sys::Date::now() as u64;
        let game = match ChorusKing::initialize(
            container,
            platform::default_audio_backend(),
            seed,
            platform::now_ms(),
        ) {
            Ok(game) => game,
            Err(e) => {
                log::error!("Startup failed: {e}");
                show_error_panel(&document, &e);
                return;
            }
        };

        let shell = Rc::new(RefCell::new(Shell {
            game,
            keyboard: KeyboardState::default(),
        }));

        // Wait for one rendered frame so the surface exists
        next_animation_frame().await;
        shell.borrow_mut().game.mark_ready();

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        setup_keyboard(shell.clone());
        setup_first_gesture(shell.clone());
        setup_visibility(shell.clone(), document.clone());
        setup_resize(shell.clone());

        request_animation_frame(shell);
        log::info!("Chorus King running!");
    }

    fn measure_container(document: &Document) -> Option<ContainerHandle> {
        document.get_element_by_id(CONTAINER_ID).map(|el| ContainerHandle {
            id: CONTAINER_ID.to_string(),
            width: el.client_width().max(0) as u32,
            height: el.client_height().max(0) as u32,
        })
    }

    /// Fatal startup error with a reload action
    fn show_error_panel(document: &Document, error: &InitError) {
        let Some(body) = document.body() else {
            return;
        };
        let Ok(panel) = document.create_element("div") else {
            return;
        };
        let _ = panel.set_attribute("id", "error-panel");
        let Ok(message) = document.create_element("p") else {
            return;
        };
        message.set_text_content(Some(&format!("Chorus King could not start: {error}")));
        let _ = panel.append_child(&message);

        if let Ok(button) = document.create_element("button") {
            button.set_text_content(Some("Reload"));
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                if let Some(window) = web_sys::window() {
                    let _ = window.location().reload();
                }
            });
            let _ = button.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
            let _ = panel.append_child(&button);
        }
        let _ = body.append_child(&panel);
    }

    async fn next_animation_frame() {
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            if let Some(window) = web_sys::window() {
                let _ = window.request_animation_frame(&resolve);
            }
        });
        let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
    }

    fn setup_keyboard(shell: Rc<RefCell<Shell>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        // Key down
        {
            let shell = shell.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut s = shell.borrow_mut();
                s.game.unlock_audio();
                let key = event.key();
                if s.keyboard.apply_key(&key, true) {
                    event.prevent_default();
                }
                if key == "Enter" {
                    start_or_advance(&mut s.game);
                }
            });
            let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Key up
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                shell.borrow_mut().keyboard.apply_key(&event.key(), false);
            });
            let _ = window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Enter leaves attract mode or moves past a cleared level
    fn start_or_advance(game: &mut ChorusKing) {
        let complete = game
            .session()
            .is_some_and(|s| s.phase == GamePhase::LevelComplete);
        if *game.mode() == Mode::Attract {
            game.start_level(LEVEL_LIST[0]);
        } else if complete && !game.advance_level() {
            game.start_attract();
        }
    }

    fn setup_first_gesture(shell: Rc<RefCell<Shell>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::PointerEvent| {
            shell.borrow_mut().game.unlock_audio();
        });
        let _ = window.add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_visibility(shell: Rc<RefCell<Shell>>, document: Document) {
        let document_clone = document.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let visible = document_clone.visibility_state() == web_sys::VisibilityState::Visible;
            shell.borrow_mut().game.set_visibility(visible);
        });
        let _ = document.add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_resize(shell: Rc<RefCell<Shell>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            if let Some(container) = measure_container(&document) {
                shell.borrow_mut().game.resize(container.width, container.height);
            }
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// First connected gamepad, if any
    fn poll_gamepad() -> Option<(Gamepad, GamepadState)> {
        let pads = web_sys::window()?.navigator().get_gamepads().ok()?;
        let pad = pads
            .iter()
            .find_map(|value| value.dyn_into::<Gamepad>().ok())
            .filter(|pad| pad.connected())?;
        let pressed: Vec<bool> = pad
            .buttons()
            .iter()
            .map(|b| b.dyn_into::<GamepadButton>().map(|b| b.pressed()).unwrap_or(false))
            .collect();
        let axes: Vec<f64> = pad.axes().iter().map(|a| a.as_f64().unwrap_or(0.0)).collect();
        let state = GamepadState::from_standard(&pressed, &axes);
        Some((pad, state))
    }

    fn play_rumble(pad: &Gamepad, rumble: Vibration) {
        let Ok(actuator) = js_sys::Reflect::get(pad, &"vibrationActuator".into()) else {
            return;
        };
        if actuator.is_undefined() || actuator.is_null() {
            return;
        }
        let Ok(play) = js_sys::Reflect::get(&actuator, &"playEffect".into()) else {
            return;
        };
        let Ok(play) = play.dyn_into::<js_sys::Function>() else {
            return;
        };
        let params = js_sys::Object::new();
        let _ = js_sys::Reflect::set(&params, &"duration".into(), &rumble.duration_ms.into());
        let _ = js_sys::Reflect::set(&params, &"weakMagnitude".into(), &rumble.weak_magnitude.into());
        let _ = js_sys::Reflect::set(&params, &"strongMagnitude".into(), &rumble.strong_magnitude.into());
        let _ = play.call2(&actuator, &"dual-rumble".into(), &params);
    }

    fn request_animation_frame(shell: Rc<RefCell<Shell>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(shell, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(shell: Rc<RefCell<Shell>>, time: f64) {
        {
            let mut s = shell.borrow_mut();
            if s.game.is_destroyed() {
                return;
            }
            let polled = poll_gamepad();
            let keyboard = s.keyboard;
            s.game.frame(time, &keyboard, polled.as_ref().map(|(_, state)| state));
            if let Some(rumble) = s.game.input().take_vibration() {
                if let Some((pad, _)) = &polled {
                    play_rumble(pad, rumble);
                }
            }
            update_hud(&s.game);
        }

        request_animation_frame(shell);
    }

    fn update_hud(game: &ChorusKing) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let Some(session) = game.session() else {
            return;
        };
        let stats = session.stats();
        let fields = [
            ("hud-score", stats.score.to_string()),
            ("hud-notes", format!("{}/{}", stats.notes_collected, stats.total_notes)),
            ("hud-combo", format!("x{}", stats.combo)),
            ("hud-deaths", stats.deaths.to_string()),
        ];
        for (id, text) in fields {
            if let Some(el) = document.get_element_by_id(id) {
                el.set_text_content(Some(&text));
            }
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    web_shell::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use chorus_king::game::CONTAINER_ID;
    use chorus_king::input::KeyboardState;
    use chorus_king::{ChorusKing, ContainerHandle, NullBackend};

    env_logger::init();
    log::info!("Chorus King (native) starting...");
    log::info!("Native mode runs attract mode headless - use `trunk serve` for the web version");

    let container = Some(ContainerHandle {
        id: CONTAINER_ID.to_string(),
        width: chorus_king::consts::VIEW_WIDTH,
        height: chorus_king::consts::VIEW_HEIGHT,
    });
    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);

    let mut game = match ChorusKing::initialize(container, Box::new(NullBackend), seed, 0.0) {
        Ok(game) => game,
        Err(e) => {
            log::error!("Startup failed: {e}");
            std::process::exit(1);
        }
    };
    game.mark_ready();

    // One simulated minute at 60 fps
    let keyboard = KeyboardState::default();
    let mut now = 0.0;
    for _ in 0..3600 {
        now += 1000.0 / 60.0;
        game.frame(now, &keyboard, None);
    }

    if let Some(session) = game.session() {
        let stats = session.stats();
        println!(
            "Attract run (seed {seed}): score {}, notes {}/{}, deaths {}, beat {}",
            stats.score,
            stats.notes_collected,
            stats.total_notes,
            stats.deaths,
            game.audio().current_beat()
        );
    }
    game.destroy();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
