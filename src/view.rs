//! Browser adapter: binds a [`Session`] to the page.
//!
//! The app lives in a single `thread_local!` slot. Every DOM callback borrows
//! it briefly through [`with_app`], asks the session what changed and mirrors
//! that into element styles. Alerts are raised after the borrow is released.

use std::cell::RefCell;

use gloo::console;
use gloo::events::{EventListener, EventListenerOptions};
use gloo::file::callbacks::{read_as_data_url, FileReader};
use gloo::timers::callback::{Interval, Timeout};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    CanvasRenderingContext2d, Document, Element, Event, HtmlCanvasElement, HtmlElement,
    HtmlImageElement, HtmlInputElement, MouseEvent, TouchEvent,
};

use crate::board::input::{PointerInput, PointerPhase, PointerSample};
use crate::board::PieceState;
use crate::config::{DomIds, PuzzleConfig};
use crate::error::PuzzleError;
use crate::session::{PointerOutcome, Session, TIME_UP_MESSAGE};
use crate::slicer::{BoardRect, GridSize, ImageSize};
use crate::timer::{TickOutcome, TimerMode};

const STARTED_CLASS: &str = "started";
const DRAGGING_CLASS: &str = "dragging";
const PIECE_CLASS: &str = "puzzle-piece";

fn dom_err(err: JsValue) -> PuzzleError {
    PuzzleError::Dom(format!("{err:?}"))
}

fn by_id<T: JsCast>(doc: &Document, id: &str) -> Result<T, PuzzleError> {
    doc.get_element_by_id(id)
        .ok_or_else(|| PuzzleError::Dom(id.to_string()))?
        .dyn_into::<T>()
        .map_err(|_| PuzzleError::Dom(id.to_string()))
}

/// Alert for player-facing errors, console otherwise.
pub fn report(err: &PuzzleError) {
    if err.is_user_facing() {
        gloo::dialogs::alert(&err.to_string());
    } else {
        console::warn!(err.to_string());
    }
}

// --- Elements -----------------------------------------------------------------

struct Elements {
    document: Document,
    file_input: HtmlInputElement,
    preview: Option<HtmlImageElement>,
    start_button: HtmlElement,
    start_challenge_button: Option<HtmlElement>,
    start_normal_button: Option<HtmlElement>,
    reset_button: HtmlElement,
    columns: HtmlInputElement,
    rows: HtmlInputElement,
    board: HtmlElement,
    wrapper: HtmlElement,
    timer_display: Option<HtmlElement>,
}

impl Elements {
    fn lookup(ids: &DomIds) -> Result<Self, PuzzleError> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| PuzzleError::Dom("document".into()))?;
        Ok(Self {
            file_input: by_id(&document, &ids.file_input)?,
            preview: by_id(&document, &ids.preview).ok(),
            start_button: by_id(&document, &ids.start_button)?,
            start_challenge_button: by_id(&document, &ids.start_challenge_button).ok(),
            start_normal_button: by_id(&document, &ids.start_normal_button).ok(),
            reset_button: by_id(&document, &ids.reset_button)?,
            columns: by_id(&document, &ids.columns_input)?,
            rows: by_id(&document, &ids.rows_input)?,
            board: by_id(&document, &ids.board)?,
            wrapper: by_id(&document, &ids.wrapper)?,
            timer_display: by_id(&document, &ids.timer_display).ok(),
            document,
        })
    }

    fn rect_of(el: &Element) -> BoardRect {
        let r = el.get_bounding_client_rect();
        BoardRect::new(r.width(), r.height())
    }

    /// Available slicing area. Inline sizing from a previous image is cleared
    /// first so the wrapper reports its laid-out size.
    fn wrapper_rect(&self) -> BoardRect {
        let style = self.wrapper.style();
        let _ = style.remove_property("width");
        let _ = style.remove_property("height");
        Self::rect_of(&self.wrapper)
    }

    fn board_rect(&self) -> BoardRect {
        Self::rect_of(&self.board)
    }

    fn grid_inputs(&self) -> (String, String) {
        (self.columns.value(), self.rows.value())
    }

    fn set_started(&self, started: bool) {
        let classes = self.wrapper.class_list();
        let _ = if started { classes.add_1(STARTED_CLASS) } else { classes.remove_1(STARTED_CLASS) };
    }
}

// --- App ----------------------------------------------------------------------

/// One rendered piece: its canvas plus the pointer-down listeners bound to it.
struct PieceView {
    canvas: HtmlCanvasElement,
    _listeners: [EventListener; 2],
}

struct App {
    session: Session,
    dom: Elements,
    pieces: Vec<PieceView>,
    image: Option<HtmlImageElement>,
    pending_image: Option<HtmlImageElement>,
    // Held until the next upload replaces them.
    _reader: Option<FileReader>,
    _image_listeners: Vec<EventListener>,
    ticker: Option<Interval>,
    scatter_timeout: Option<Timeout>,
    win_timeout: Option<Timeout>,
    _listeners: Vec<EventListener>,
}

thread_local! {
    static APP: RefCell<Option<App>> = const { RefCell::new(None) };
}

fn with_app<T>(f: impl FnOnce(&mut App) -> T) -> Option<T> {
    APP.with(|cell| match cell.try_borrow_mut() {
        Ok(mut slot) => slot.as_mut().map(f),
        Err(_) => {
            console::warn!("puzzle app busy; event dropped");
            None
        }
    })
}

fn not_mounted() -> PuzzleError {
    PuzzleError::Dom("puzzle app not mounted".into())
}

/// Bind to the page described by `config.ids`. Mounting again replaces the
/// previous app and its listeners.
pub fn mount(config: PuzzleConfig) -> Result<(), PuzzleError> {
    let dom = Elements::lookup(&config.ids)?;
    let (cols, rows) = dom.grid_inputs();
    let grid = GridSize::parse(&cols, &rows, config.default_grid);
    let mut session = Session::new(config);
    session.set_grid(grid, BoardRect::new(0.0, 0.0));

    let listeners = install_listeners(&dom);
    let app = App {
        session,
        dom,
        pieces: Vec::new(),
        image: None,
        pending_image: None,
        _reader: None,
        _image_listeners: Vec::new(),
        ticker: None,
        scatter_timeout: None,
        win_timeout: None,
        _listeners: listeners,
    };
    app.write_grid_inputs();
    app.render_timer_label(crate::performance_now());
    APP.with(|cell| cell.replace(Some(app)));
    console::log!("puzzle app mounted");
    Ok(())
}

fn install_listeners(dom: &Elements) -> Vec<EventListener> {
    let mut out = vec![
        EventListener::new(&dom.file_input, "change", |_| {
            upload_image();
        }),
        EventListener::new(&dom.start_button, "click", |_| {
            start(None);
        }),
        EventListener::new(&dom.reset_button, "click", |_| reset()),
        EventListener::new(&dom.columns, "change", |_| grid_changed()),
        EventListener::new(&dom.rows, "change", |_| grid_changed()),
    ];
    if let Some(btn) = &dom.start_challenge_button {
        out.push(EventListener::new(btn, "click", |_| {
            start(Some(TimerMode::Countdown));
        }));
    }
    if let Some(btn) = &dom.start_normal_button {
        out.push(EventListener::new(btn, "click", |_| {
            start(Some(TimerMode::CountUp));
        }));
    }

    // Move / release are tracked on the document so a fast drag that leaves
    // the piece keeps following the pointer.
    let doc = &dom.document;
    for (kind, phase) in [("mousemove", PointerPhase::Move), ("mouseup", PointerPhase::Up)] {
        out.push(EventListener::new_with_options(doc, kind, EventListenerOptions::enable_prevent_default(), move |event: &Event| {
            if let Some(evt) = event.dyn_ref::<MouseEvent>() {
                on_pointer(PointerInput::from_mouse(evt, phase), None, event);
            }
        }));
    }
    for (kind, phase) in [
        ("touchmove", PointerPhase::Move),
        ("touchend", PointerPhase::Up),
        ("touchcancel", PointerPhase::Cancel),
    ] {
        out.push(EventListener::new_with_options(doc, kind, EventListenerOptions::enable_prevent_default(), move |event: &Event| {
            if let Some(input) = event.dyn_ref::<TouchEvent>().and_then(|evt| PointerInput::from_touch(evt, phase)) {
                on_pointer(input, None, event);
            }
        }));
    }
    out
}

fn piece_listeners(canvas: &HtmlCanvasElement, index: usize) -> [EventListener; 2] {
    [
        EventListener::new_with_options(canvas, "mousedown", EventListenerOptions::enable_prevent_default(), move |event: &Event| {
            if let Some(evt) = event.dyn_ref::<MouseEvent>() {
                on_pointer(PointerInput::from_mouse(evt, PointerPhase::Down), Some(index), event);
            }
        }),
        EventListener::new_with_options(canvas, "touchstart", EventListenerOptions::enable_prevent_default(), move |event: &Event| {
            if let Some(input) =
                event.dyn_ref::<TouchEvent>().and_then(|evt| PointerInput::from_touch(evt, PointerPhase::Down))
            {
                on_pointer(input, Some(index), event);
            }
        }),
    ]
}

// --- Entry points -------------------------------------------------------------

/// Read the selected file and decode it. Returns false when nothing was
/// selected or the app is not mounted.
pub fn upload_image() -> bool {
    let file = with_app(|app| app.dom.file_input.files().and_then(|list| list.get(0))).flatten();
    let Some(file) = file else {
        report(&PuzzleError::NoFileSelected);
        return false;
    };
    let file = gloo::file::File::from(file);
    let reader = read_as_data_url(&file, |result| match result {
        Ok(url) => on_data_url(url),
        Err(err) => {
            console::warn!(format!("file read failed: {err}"));
            on_image_error();
        }
    });
    with_app(|app| app._reader = Some(reader)).is_some()
}

fn on_data_url(url: String) {
    load_image_url(&url);
}

/// Decode an image from a URL (the file reader hands over a data URL).
/// Returns false when the app is not mounted or decoding could not begin.
pub fn load_image_url(url: &str) -> bool {
    let result = with_app(|app| app.decode(url)).unwrap_or_else(|| Err(not_mounted()));
    match result {
        Ok(()) => true,
        Err(err) => {
            report(&err);
            false
        }
    }
}

fn on_image_loaded() {
    let result = with_app(|app| app.image_ready()).unwrap_or_else(|| Err(not_mounted()));
    if let Err(err) = result {
        report(&err);
    }
}

fn on_image_error() {
    with_app(|app| app.image_failed());
    report(&PuzzleError::ImageDecode);
}

/// Start a game; `None` keeps the selected timer mode.
pub fn start(mode: Option<TimerMode>) -> bool {
    let result = with_app(|app| app.start(mode)).unwrap_or_else(|| Err(not_mounted()));
    match result {
        Ok(()) => true,
        Err(err) => {
            report(&err);
            false
        }
    }
}

pub fn reset() {
    with_app(|app| app.reset());
}

fn grid_changed() {
    let result = with_app(|app| app.grid_changed()).unwrap_or_else(|| Err(not_mounted()));
    if let Err(err) = result {
        report(&err);
    }
}

fn on_pointer(input: PointerInput, target: Option<usize>, event: &Event) {
    let Some(sample) = input.sample() else {
        return;
    };
    let outcome = with_app(|app| app.pointer(sample, target)).unwrap_or(PointerOutcome::Ignored);
    if outcome != PointerOutcome::Ignored {
        event.prevent_default();
    }
}

fn on_tick() {
    if with_app(|app| app.tick()).unwrap_or(false) {
        gloo::dialogs::alert(TIME_UP_MESSAGE);
    }
}

fn on_win_delay() {
    if let Some(message) = with_app(|app| app.finish_win()).flatten() {
        gloo::dialogs::alert(&message);
    }
}

// --- App behaviour --------------------------------------------------------------

impl App {
    fn decode(&mut self, url: &str) -> Result<(), PuzzleError> {
        if let Some(preview) = &self.dom.preview {
            preview.set_src(url);
            preview.style().set_property("display", "block").map_err(dom_err)?;
        }
        let img = HtmlImageElement::new().map_err(dom_err)?;
        self._image_listeners = vec![
            EventListener::once(&img, "load", |_| on_image_loaded()),
            EventListener::once(&img, "error", |_| on_image_error()),
        ];
        img.set_src(url);
        self.pending_image = Some(img);
        Ok(())
    }

    fn image_ready(&mut self) -> Result<(), PuzzleError> {
        let Some(img) = self.pending_image.take() else {
            return Ok(());
        };
        self.cancel_pending();
        let size = ImageSize { width: img.natural_width() as f64, height: img.natural_height() as f64 };
        let rect = self.dom.wrapper_rect();
        let loaded = self.session.load_image(size, rect).map(|_| ());
        if let Err(err) = loaded {
            self.clear_pieces();
            return Err(err);
        }
        self.image = Some(img);
        self.dom.set_started(false);
        self.render_pieces()?;
        self.render_timer_label(crate::performance_now());
        console::log!(format!(
            "image {}x{} sliced into {} pieces",
            size.width,
            size.height,
            self.session.board().len()
        ));
        Ok(())
    }

    fn image_failed(&mut self) {
        self.cancel_pending();
        self.pending_image = None;
        self.image = None;
        self.session.image_failed();
        self.dom.set_started(false);
        self.clear_pieces();
    }

    fn start(&mut self, mode: Option<TimerMode>) -> Result<(), PuzzleError> {
        let now = crate::performance_now();
        self.session.start(mode, now)?;
        self.cancel_pending();
        self.dom.set_started(true);
        self.sync_all_pieces();
        if self.session.clock().is_running() {
            let every = self.session.config().tick_interval_ms;
            self.ticker = Some(Interval::new(every, on_tick));
        }
        self.render_timer_label(now);
        let delay = self.session.config().scatter_delay_ms;
        self.scatter_timeout = Some(Timeout::new(delay, || {
            with_app(|app| app.scatter());
        }));
        console::log!(format!("game started ({:?})", self.session.mode()));
        Ok(())
    }

    fn scatter(&mut self) {
        let rect = self.dom.board_rect();
        if self.session.scatter(&mut rand::thread_rng(), rect) {
            self.sync_all_pieces();
        }
    }

    fn reset(&mut self) {
        self.cancel_pending();
        if self.session.reset() {
            self.dom.set_started(false);
            self.sync_all_pieces();
        }
        self.render_timer_label(crate::performance_now());
    }

    fn grid_changed(&mut self) -> Result<(), PuzzleError> {
        let (cols, rows) = self.dom.grid_inputs();
        let grid = GridSize::parse(&cols, &rows, self.session.config().default_grid);
        self.cancel_pending();
        self.dom.set_started(false);
        let rect = if self.session.image().is_some() { self.dom.wrapper_rect() } else { BoardRect::new(0.0, 0.0) };
        let resliced = self.session.set_grid(grid, rect).is_some();
        self.write_grid_inputs();
        if resliced {
            self.render_pieces()?;
        }
        self.render_timer_label(crate::performance_now());
        Ok(())
    }

    fn pointer(&mut self, sample: PointerSample, target: Option<usize>) -> PointerOutcome {
        let outcome = self.session.pointer(sample, target, crate::performance_now());
        match outcome {
            PointerOutcome::Began(index) => {
                if let Some(view) = self.pieces.get(index) {
                    // Re-append to draw above siblings.
                    let _ = self.dom.wrapper.append_child(&view.canvas);
                }
                self.sync_piece(index);
            }
            PointerOutcome::Moved(index) => self.sync_piece(index),
            PointerOutcome::Dropped { index, completed, .. } => {
                self.sync_piece(index);
                if completed {
                    self.ticker = None;
                    self.render_timer_label(crate::performance_now());
                    let delay = self.session.config().win_delay_ms;
                    self.win_timeout = Some(Timeout::new(delay, on_win_delay));
                }
            }
            PointerOutcome::Ignored => {}
        }
        outcome
    }

    /// Returns true when the countdown just ran out.
    fn tick(&mut self) -> bool {
        let now = crate::performance_now();
        match self.session.tick(now) {
            TickOutcome::Display(text) => {
                self.set_timer_text(Some(&text));
                false
            }
            TickOutcome::TimedOut => {
                self.ticker = None;
                self.dom.set_started(false);
                self.sync_all_pieces();
                self.render_timer_label(now);
                console::log!("countdown expired");
                true
            }
            TickOutcome::Idle => {
                self.ticker = None;
                false
            }
        }
    }

    fn finish_win(&mut self) -> Option<String> {
        let message = self.session.finish_win()?;
        self.ticker = None;
        self.dom.set_started(false);
        self.render_timer_label(crate::performance_now());
        console::log!("puzzle completed");
        Some(message)
    }

    /// Drop every running interval and pending timeout.
    fn cancel_pending(&mut self) {
        self.ticker = None;
        self.scatter_timeout = None;
        self.win_timeout = None;
    }

    fn write_grid_inputs(&self) {
        let grid = self.session.grid();
        self.dom.columns.set_value(&grid.columns.to_string());
        self.dom.rows.set_value(&grid.rows.to_string());
    }

    fn clear_pieces(&mut self) {
        self.pieces.clear();
        self.dom.wrapper.set_inner_html("");
    }

    fn render_pieces(&mut self) -> Result<(), PuzzleError> {
        self.clear_pieces();
        let (Some(layout), Some(img)) = (self.session.layout().cloned(), self.image.clone()) else {
            return Ok(());
        };
        let style = self.dom.wrapper.style();
        style.set_property("width", &format!("{}px", layout.draw_width)).map_err(dom_err)?;
        style.set_property("height", &format!("{}px", layout.draw_height)).map_err(dom_err)?;

        let (pw, ph) = (layout.piece_width, layout.piece_height);
        for (index, cell) in layout.cells.iter().enumerate() {
            let canvas: HtmlCanvasElement = self
                .dom
                .document
                .create_element("canvas")
                .map_err(dom_err)?
                .dyn_into()
                .map_err(|_| PuzzleError::Dom("canvas".into()))?;
            canvas.set_width(pw as u32);
            canvas.set_height(ph as u32);
            let _ = canvas.class_list().add_1(PIECE_CLASS);
            let _ = canvas.style().set_property("position", "absolute");
            let ctx: CanvasRenderingContext2d = canvas
                .get_context("2d")
                .map_err(dom_err)?
                .ok_or_else(|| PuzzleError::Dom("2d context".into()))?
                .dyn_into()
                .map_err(|_| PuzzleError::Dom("2d context".into()))?;
            let src = cell.src;
            if src.w > 0.0 && src.h > 0.0 {
                ctx.draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                    &img, src.x, src.y, src.w, src.h, 0.0, 0.0, pw, ph,
                )
                .map_err(dom_err)?;
            }
            self.dom.wrapper.append_child(&canvas).map_err(dom_err)?;
            let listeners = piece_listeners(&canvas, index);
            self.pieces.push(PieceView { canvas, _listeners: listeners });
        }
        self.sync_all_pieces();
        Ok(())
    }

    fn sync_all_pieces(&self) {
        for index in 0..self.pieces.len() {
            self.sync_piece(index);
        }
    }

    fn sync_piece(&self, index: usize) {
        let (Some(view), Some(piece)) = (self.pieces.get(index), self.session.board().piece(index)) else {
            return;
        };
        let style = view.canvas.style();
        let dragging = piece.state == PieceState::Dragging;
        let _ = style.set_property("left", &format!("{}px", piece.position.0));
        let _ = style.set_property("top", &format!("{}px", piece.position.1));
        let _ = style.set_property("transform", &format!("rotate({}deg)", piece.rotation));
        let _ = style.set_property("pointer-events", if piece.interactive { "auto" } else { "none" });
        let classes = view.canvas.class_list();
        if dragging {
            let _ = classes.add_1(DRAGGING_CLASS);
            let _ = style.set_property("transition", "none");
        } else {
            let _ = classes.remove_1(DRAGGING_CLASS);
            let _ = style.remove_property("transition");
        }
    }

    fn set_timer_text(&self, text: Option<&str>) {
        let Some(el) = &self.dom.timer_display else {
            return;
        };
        match text {
            Some(text) => {
                el.set_text_content(Some(text));
                let _ = el.style().remove_property("display");
            }
            None => {
                el.set_text_content(None);
                let _ = el.style().set_property("display", "none");
            }
        }
    }

    fn render_timer_label(&self, now: f64) {
        let label = self.session.timer_label(now);
        self.set_timer_text(label.as_deref());
    }
}
