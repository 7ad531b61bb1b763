//! Rekt Runner entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element, HtmlCanvasElement, HtmlInputElement, KeyboardEvent, PointerEvent};

    use rekt_runner::consts::*;
    use rekt_runner::leaderboard::{Leaderboard, LeaderboardView, format_score};
    use rekt_runner::profile::{self, CharacterId, SaveRecord, Selection, ShopItem};
    use rekt_runner::renderer::CanvasRenderer;
    use rekt_runner::sim::{RunStatus, Simulation};
    use rekt_runner::tuning::Tuning;
    use rekt_runner::ui;

    fn document() -> Option<Document> {
        web_sys::window()?.document()
    }

    fn set_text(doc: &Document, id: &str, text: &str) {
        if let Some(el) = doc.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_hidden(doc: &Document, id: &str, hidden: bool) {
        if let Some(el) = doc.get_element_by_id(id) {
            let classes = el.class_list();
            let _ = if hidden {
                classes.add_1("hidden")
            } else {
                classes.remove_1("hidden")
            };
        }
    }

    fn today() -> chrono::NaiveDate {
        chrono::Utc::now().date_naive()
    }

    /// Game instance holding all state
    struct Game {
        sim: Simulation,
        renderer: Option<CanvasRenderer>,
        profile: SaveRecord,
        leaderboard: Leaderboard,
        lb_view: LeaderboardView,
        last_time: f64,
        /// Score of the last finished run, once settled
        last_score: Option<f64>,
        submitted: bool,
        toast_until: f64,
    }

    impl Game {
        fn new(seed: u64, tuning: Tuning) -> Self {
            Self {
                sim: Simulation::with_tuning(seed, tuning),
                renderer: None,
                profile: SaveRecord::load(),
                leaderboard: Leaderboard::load(),
                lb_view: LeaderboardView::Weekly,
                last_time: 0.0,
                last_score: None,
                submitted: false,
                toast_until: 0.0,
            }
        }

        fn toast(&mut self, text: &str) {
            if let Some(doc) = document() {
                set_text(&doc, "toast", text);
                set_hidden(&doc, "toast", false);
            }
            self.toast_until = js_sys::Date::now() + f64::from(TOAST_MS);
        }

        fn selected_shop_items(doc: &Document) -> Vec<ShopItem> {
            let Ok(inputs) = doc.query_selector_all("input[data-shop]") else {
                return Vec::new();
            };
            (0..inputs.length())
                .filter_map(|i| inputs.get(i))
                .filter_map(|node| node.dyn_into::<HtmlInputElement>().ok())
                .filter(|input| input.checked())
                .filter_map(|input| input.get_attribute("data-shop"))
                .filter_map(|id| ShopItem::from_id(&id))
                .collect()
        }

        fn start_run(&mut self) {
            let Some(doc) = document() else { return };

            let items = Self::selected_shop_items(&doc);
            let (modifiers, receipt) = self.profile.prepare_run(&items);
            if let Some(text) = ui::receipt_message(&receipt) {
                self.toast(&text);
            }
            if let Some(bonus) = self.profile.claim_daily(today()) {
                self.toast(&ui::daily_message(&bonus));
            }
            self.profile.save();

            self.sim.start_run(modifiers);
            self.last_score = None;
            self.submitted = false;

            set_hidden(&doc, "menu", true);
            set_hidden(&doc, "gameover", true);
            self.render_side_stats(&doc);
        }

        fn back_to_menu(&mut self) {
            self.sim.reset_run();
            if let Some(doc) = document() {
                set_hidden(&doc, "gameover", true);
                set_hidden(&doc, "menu", false);
            }
        }

        fn update(&mut self, dt: f32) {
            self.sim.update(dt);
            for event in self.sim.drain_events() {
                if let Some(text) = ui::toast_message(&event) {
                    self.toast(&text);
                }
            }

            if self.sim.status() == RunStatus::GameOver && self.last_score.is_none() {
                self.settle();
            }

            if self.toast_until > 0.0 && js_sys::Date::now() > self.toast_until {
                self.toast_until = 0.0;
                if let Some(doc) = document() {
                    set_hidden(&doc, "toast", true);
                }
            }
        }

        /// Pay out the finished run and show the result panel
        fn settle(&mut self) {
            let score = self.sim.run().score;
            let settlement = self.profile.settle_run(score, today());
            self.profile.save();
            self.last_score = Some(score);

            if let Some(doc) = document() {
                set_text(&doc, "go-line", &ui::settlement_line(score, &settlement));
                set_hidden(&doc, "gameover", false);
                self.render_side_stats(&doc);
                self.render_characters(&doc);
            }
        }

        fn submit_score(&mut self) {
            let Some(score) = self.last_score.filter(|_| !self.submitted) else {
                self.toast("No run to submit yet.");
                return;
            };
            let Some(doc) = document() else { return };

            let name = doc
                .get_element_by_id("player-name")
                .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
                .map(|input| input.value())
                .unwrap_or_default();
            let week = profile::week_key(today());
            let rank = self.leaderboard.submit(
                &name,
                profile::whole_score(score),
                &week,
                js_sys::Date::now(),
            );
            self.submitted = true;
            self.leaderboard.save();

            match rank {
                Some(rank) => self.toast(&format!("Score submitted (#{})", rank)),
                None => self.toast("Score did not make the board."),
            }
            self.render_leaderboard(&doc);
        }

        fn select_character(&mut self, id: CharacterId) {
            let name = id.def().name;
            match self.profile.select_character(id) {
                Ok(Selection::Unlocked { .. }) => self.toast(&format!("Unlocked: {}", name)),
                Ok(Selection::Selected) => self.toast(&format!("Selected: {}", name)),
                Err(err) => self.toast(&err.to_string()),
            }
            self.profile.save();
            if let Some(doc) = document() {
                self.render_side_stats(&doc);
                self.render_characters(&doc);
            }
        }

        fn reset_progress(&mut self) {
            SaveRecord::clear_storage();
            Leaderboard::clear_storage();
            self.profile = SaveRecord::default();
            self.leaderboard = Leaderboard::new();
            log::info!("Progress reset");
            self.back_to_menu();
            if let Some(doc) = document() {
                self.render_all(&doc);
            }
        }

        fn render(&self) {
            if let Some(renderer) = &self.renderer {
                renderer.render(&self.sim);
            }
        }

        fn update_hud(&self, doc: &Document) {
            let hud = self.sim.hud();
            set_text(doc, "hud-score", &format_score(hud.score));
            set_text(doc, "hud-mult", &ui::format_multiplier(hud.multiplier));
            set_text(doc, "hud-lives", &ui::lives_text(hud.lives, hud.max_lives));
            set_text(doc, "hud-status", &ui::status_line(&hud));
        }

        fn render_side_stats(&self, doc: &Document) {
            set_text(doc, "credits", &self.profile.credits.to_string());
            set_text(doc, "streak", &self.profile.streak.to_string());
            set_text(doc, "best-all", &format_score(self.profile.best_all_time as f64));
            set_text(doc, "best-week", &format_score(self.profile.best_week as f64));
        }

        fn render_characters(&self, doc: &Document) {
            let Some(grid) = doc.get_element_by_id("char-grid") else { return };
            let selected = self.profile.selected_character();
            let html: String = CharacterId::ALL
                .into_iter()
                .map(|id| {
                    let def = id.def();
                    let badge = if self.profile.is_unlocked(id) {
                        "Unlocked".to_string()
                    } else {
                        format!("{} cr", def.cost)
                    };
                    let class = if id == selected { "char sel" } else { "char" };
                    format!(
                        r#"<div class="{}" data-char="{}"><b>{}</b> <span class="badge">{}</span><div class="small">{}</div></div>"#,
                        class,
                        id.as_str(),
                        def.name,
                        badge,
                        def.description
                    )
                })
                .collect();
            grid.set_inner_html(&html);
        }

        fn render_leaderboard(&self, doc: &Document) {
            let Some(box_el) = doc.get_element_by_id("lb") else { return };
            let week = profile::week_key(today());
            let rows = self.leaderboard.view(self.lb_view, &week);
            if rows.is_empty() {
                box_el.set_inner_html(r#"<div class="small">No scores yet. Play a run and submit!</div>"#);
                return;
            }
            let html: String = rows
                .iter()
                .enumerate()
                .map(|(i, row)| {
                    format!(
                        r#"<div class="lb-row"><span class="name">{}. {}</span><span class="score">{}</span></div>"#,
                        i + 1,
                        escape_html(&row.name),
                        format_score(row.score as f64)
                    )
                })
                .collect();
            box_el.set_inner_html(&html);
        }

        fn render_all(&self, doc: &Document) {
            self.render_side_stats(doc);
            self.render_characters(doc);
            self.render_leaderboard(doc);
            self.update_hud(doc);
        }
    }

    fn escape_html(text: &str) -> String {
        text.chars()
            .map(|c| match c {
                '&' => "&amp;".to_string(),
                '<' => "&lt;".to_string(),
                '>' => "&gt;".to_string(),
                '"' => "&quot;".to_string(),
                '\'' => "&#039;".to_string(),
                c => c.to_string(),
            })
            .collect()
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }

        log::info!("Rekt Runner starting...");

        let document = document().ok_or("no document")?;
        let canvas: HtmlCanvasElement = document
            .get_element_by_id("c")
            .ok_or("no canvas")?
            .dyn_into()?;

        // Balance overrides ride along on the canvas element
        let tuning = canvas
            .get_attribute("data-tuning")
            .map(|json| Tuning::from_json_or_default(&json))
            .unwrap_or_default();

        let seed = js_sys::Date::now() as u64;
        let mut game = Game::new(seed, tuning);
        game.renderer = Some(CanvasRenderer::new(&canvas, CANVAS_WIDTH, CANVAS_HEIGHT)?);
        game.render_all(&document);
        log::info!("Game initialized with seed: {}", seed);

        let game = Rc::new(RefCell::new(game));
        setup_input_handlers(&canvas, &game);
        setup_buttons(&document, &game);

        request_animation_frame(game);

        log::info!("Rekt Runner running!");
        Ok(())
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: &Rc<RefCell<Game>>) {
        // Tap / click to jump
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let mut g = game.borrow_mut();
                if g.sim.status() == RunStatus::Running {
                    event.prevent_default();
                    g.sim.request_jump();
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        {
            let game = game.clone();
            let Some(window) = web_sys::window() else { return };
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                let running = g.sim.status() == RunStatus::Running;
                match event.key().as_str() {
                    " " | "ArrowUp" | "w" | "W" if running => {
                        event.prevent_default();
                        g.sim.request_jump();
                    }
                    "Enter" if !running => g.start_run(),
                    "Escape" if running => g.back_to_menu(),
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn on_click(doc: &Document, id: &str, game: &Rc<RefCell<Game>>, action: fn(&mut Game)) {
        if let Some(el) = doc.get_element_by_id(id) {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                action(&mut game.borrow_mut());
            });
            let _ = el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(doc: &Document, game: &Rc<RefCell<Game>>) {
        on_click(doc, "btn-start", game, Game::start_run);
        on_click(doc, "btn-again", game, Game::start_run);
        on_click(doc, "btn-menu", game, Game::back_to_menu);
        on_click(doc, "btn-submit", game, Game::submit_score);
        on_click(doc, "btn-reset", game, Game::reset_progress);

        // Character cards are re-rendered, so listen on the grid
        if let Some(grid) = doc.get_element_by_id("char-grid") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::MouseEvent| {
                let card = event
                    .target()
                    .and_then(|t| t.dyn_into::<Element>().ok())
                    .and_then(|el| el.closest("[data-char]").ok().flatten());
                let id = card
                    .and_then(|el| el.get_attribute("data-char"))
                    .and_then(|id| id.parse::<CharacterId>().ok());
                if let Some(id) = id {
                    game.borrow_mut().select_character(id);
                }
            });
            let _ = grid.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Leaderboard tabs
        if let Ok(tabs) = doc.query_selector_all(".tab[data-tab]") {
            for i in 0..tabs.length() {
                let Some(tab) = tabs.get(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
                    continue;
                };
                let game = game.clone();
                let all_tabs = tabs.clone();
                let this_tab = tab.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                    for j in 0..all_tabs.length() {
                        if let Some(el) = all_tabs.get(j).and_then(|n| n.dyn_into::<Element>().ok()) {
                            let _ = el.class_list().remove_1("active");
                        }
                    }
                    let _ = this_tab.class_list().add_1("active");

                    let mut g = game.borrow_mut();
                    g.lb_view = match this_tab.get_attribute("data-tab").as_deref() {
                        Some("all") => LeaderboardView::AllTime,
                        _ => LeaderboardView::Weekly,
                    };
                    if let Some(doc) = document() {
                        g.render_leaderboard(&doc);
                    }
                });
                let _ = tab.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
                closure.forget();
            }
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            // Calculate delta time; the simulation clamps long frames
            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                FRAME_DT
            };
            g.last_time = time;

            g.update(dt);
            g.render();
            if let Some(doc) = document() {
                g.update_hud(&doc);
            }
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless autopilot run for smoke testing
#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use rekt_runner::consts::FRAME_DT;
    use rekt_runner::leaderboard::{Leaderboard, format_score};
    use rekt_runner::profile::{SaveRecord, week_key, whole_score};
    use rekt_runner::sim::{RunStatus, Simulation, autopilot};
    use rekt_runner::tuning::Tuning;
    use rekt_runner::ui;

    /// Simulated time after which the run is stopped
    const MAX_SECONDS: f32 = 180.0;

    pub fn run(seed: u64, tuning: Tuning) {
        let today = chrono::Utc::now().date_naive();
        let mut profile = SaveRecord::load();
        if let Some(bonus) = profile.claim_daily(today) {
            log::info!("{}", ui::daily_message(&bonus));
        }

        let (modifiers, _) = profile.prepare_run(&[]);
        let mut sim = Simulation::with_tuning(seed, tuning);
        sim.start_run(modifiers);

        let max_ticks = (MAX_SECONDS / FRAME_DT) as u32;
        let mut ticks = 0;
        while sim.status() == RunStatus::Running && ticks < max_ticks {
            autopilot::step(&mut sim, FRAME_DT);
            for event in sim.drain_events() {
                match ui::toast_message(&event) {
                    Some(text) => log::info!("{}", text),
                    None => log::trace!("{:?}", event),
                }
            }
            ticks += 1;
        }

        let hud = sim.hud();
        let settlement = profile.settle_run(hud.score, today);
        profile.save();

        let mut board = Leaderboard::load();
        let rank = board.submit(
            "@autopilot",
            whole_score(hud.score),
            &week_key(today),
            chrono::Utc::now().timestamp_millis() as f64,
        );
        board.save();

        println!("seed:       {}", seed);
        println!("time:       {:.1}s", ticks as f32 * FRAME_DT);
        println!("distance:   {:.0}", sim.run().distance);
        println!("score:      {}", format_score(hud.score));
        println!("lives left: {}", ui::lives_text(hud.lives, hud.max_lives));
        println!("{}", ui::settlement_line(hud.score, &settlement));
        if let Some(rank) = rank {
            println!("leaderboard rank: #{}", rank);
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Rekt Runner (native) starting...");

    // Usage: rekt-runner [seed] [tuning.json]
    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(42);
    let tuning = match args.next() {
        Some(path) => match std::fs::read_to_string(&path) {
            Ok(json) => rekt_runner::tuning::Tuning::from_json_or_default(&json),
            Err(err) => {
                log::warn!("Cannot read tuning file {}: {}", path, err);
                rekt_runner::tuning::Tuning::default()
            }
        },
        None => rekt_runner::tuning::Tuning::default(),
    };

    headless::run(seed, tuning);
}
