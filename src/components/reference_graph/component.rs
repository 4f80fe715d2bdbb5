use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, MouseEvent, Window};

use super::checklist::{Checklist, ChecklistItem, CollapsibleList, SelectionList};
use super::config::GraphConfig;
use super::interaction::PointerController;
use super::layout::{ForceLayout, LayoutEngine};
use super::membership::{Membership, ToggleError, ToggleRequest};
use super::render;
use super::scale::ScreenMapping;
use super::source::HttpReferenceSource;
use super::types::Point;

/// Longest simulation step taken for one frame, in seconds.
const MAX_FRAME_DT: f32 = 0.05;
const FALLBACK_SIZE: (f64, f64) = (800.0, 600.0);

/// Everything one graph canvas shares between its event handlers.
pub struct Session {
	pub layout: RefCell<ForceLayout>,
	pub pointer: RefCell<PointerController>,
	pub membership: RefCell<Membership>,
	pub source: HttpReferenceSource,
	pub config: GraphConfig,
}

impl Session {
	fn new(config: GraphConfig) -> Self {
		let (w, h) = FALLBACK_SIZE;
		let mapping = ScreenMapping::new(w, h, config.padding);
		Self {
			layout: RefCell::new(ForceLayout::new(&config.simulation, mapping)),
			pointer: RefCell::new(PointerController::new(&config)),
			membership: RefCell::new(Membership::new()),
			source: HttpReferenceSource::new(config.endpoint.clone()),
			config,
		}
	}

	/// Takes the toggle lock now and applies the toggle in the background.
	pub fn toggle(self: &Rc<Self>, request: ToggleRequest) -> Result<(), ToggleError> {
		let pending = self.membership.borrow().begin(request)?;
		let session = Rc::clone(self);
		spawn_local(async move {
			pending
				.run(&session.membership, &session.layout, &session.source)
				.await;
		});
		Ok(())
	}
}

fn canvas_point(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> Point {
	let rect = canvas.get_bounding_client_rect();
	Point::new(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

fn window_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

#[component]
pub fn ReferenceGraph(
	#[prop(optional)] config: GraphConfig,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let session = Rc::new(Session::new(config));
	let documents = RwSignal::new(Vec::<ChecklistItem>::new());
	let hovered = RwSignal::new(None::<String>);
	let selection = RwSignal::new(Vec::<String>::new());
	let grabbing = RwSignal::new(false);

	let animate: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let key_cb: Rc<RefCell<Option<Closure<dyn FnMut(KeyboardEvent)>>>> =
		Rc::new(RefCell::new(None));

	let session_load = session.clone();
	spawn_local(async move {
		match session_load.source.fetch_index().await {
			Ok(index) => {
				let cap = session_load.config.max_items.unwrap_or(usize::MAX);
				if index.is_empty() {
					warn!("reference listing is empty");
				}
				info!("reference listing has {} documents", index.len());
				documents.set(index.documents().take(cap).map(ChecklistItem::new).collect());
			}
			Err(err) => warn!("could not load the reference listing: {err}"),
		}
	});

	let (session_init, animate_init, resize_cb_init, key_cb_init) =
		(session.clone(), animate.clone(), resize_cb.clone(), key_cb.clone());
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window).unwrap_or(FALLBACK_SIZE)
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(FALLBACK_SIZE.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(FALLBACK_SIZE.1)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(mut ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			warn!("canvas has no 2d context");
			return;
		};
		{
			let mut layout = session_init.layout.borrow_mut();
			layout.configure_screen(w, h);
			layout.configure_padding(session_init.config.padding);
		}

		if fullscreen {
			let (session_resize, canvas_resize) = (session_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some((nw, nh)) = web_sys::window().as_ref().and_then(window_size) else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				session_resize.layout.borrow_mut().configure_screen(nw, nh);
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let session_key = session_init.clone();
		*key_cb_init.borrow_mut() = Some(Closure::new(move |ev: KeyboardEvent| {
			let layout = session_key.layout.borrow();
			let mut pointer = session_key.pointer.borrow_mut();
			if pointer.key_press(&*layout, &ev.key()).is_some() {
				selection.set(pointer.selection().to_vec());
			}
		}));
		if let Some(ref cb) = *key_cb_init.borrow() {
			let _ = window.add_event_listener_with_callback("keypress", cb.as_ref().unchecked_ref());
		}

		let (session_anim, animate_inner) = (session_init.clone(), animate_init.clone());
		let last_frame = Cell::new(None::<f64>);
		*animate_init.borrow_mut() = Some(Closure::new(move |now: f64| {
			let dt = last_frame
				.replace(Some(now))
				.map_or(0.016, |prev| ((now - prev) / 1000.0) as f32)
				.clamp(0.0, MAX_FRAME_DT);
			session_anim.layout.borrow_mut().tick(dt);
			{
				let layout = session_anim.layout.borrow();
				let membership = session_anim.membership.borrow();
				render::render(
					&*layout,
					membership.checked(),
					&session_anim.config.palette,
					&mut ctx,
				);
			}
			if let (Some(cb), Some(win)) = (&*animate_inner.borrow(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let session_md = session.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let at = canvas_point(&canvas, &ev);
		let mut layout = session_md.layout.borrow_mut();
		let mut pointer = session_md.pointer.borrow_mut();
		pointer.pointer_down(&mut *layout, at);
		grabbing.set(pointer.dragging().is_some());
	};

	let session_mm = session.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let at = canvas_point(&canvas, &ev);
		let mut layout = session_mm.layout.borrow_mut();
		let mut pointer = session_mm.pointer.borrow_mut();
		pointer.pointer_move(&mut *layout, at);
		if grabbing.get_untracked() != pointer.dragging().is_some() {
			grabbing.set(pointer.dragging().is_some());
		}
		let now = pointer.hovered().map(str::to_owned);
		if hovered.get_untracked() != now {
			hovered.set(now);
		}
	};

	let session_mu = session.clone();
	let on_mouseup = move |_: MouseEvent| {
		let mut layout = session_mu.layout.borrow_mut();
		session_mu.pointer.borrow_mut().pointer_up(&mut *layout);
		grabbing.set(false);
	};

	let session_ml = session.clone();
	let on_mouseleave = move |_: MouseEvent| {
		let mut layout = session_ml.layout.borrow_mut();
		session_ml.pointer.borrow_mut().pointer_leave(&mut *layout);
		hovered.set(None);
		grabbing.set(false);
	};

	let stored = StoredValue::new_local(session);

	view! {
		<div class="reference-graph">
			<canvas
				node_ref=canvas_ref
				class="reference-graph-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				style=move || {
					if grabbing.get() {
						"display: block; cursor: grabbing;"
					} else {
						"display: block; cursor: grab;"
					}
				}
			/>
			<aside class="graph-panel">
				<p class="nearest">"Nearest: " {move || hovered.get().unwrap_or_default()}</p>
				<CollapsibleList title="Documents">
					<Checklist items=documents session=stored />
				</CollapsibleList>
				<CollapsibleList title="Selected">
					<SelectionList items=selection />
				</CollapsibleList>
			</aside>
		</div>
	}
}
