use std::rc::Rc;

use leptos::prelude::*;
use log::warn;
use web_sys::HtmlInputElement;

use super::component::Session;
use super::membership::{ToggleError, ToggleRequest};

/// One document in the checklist. `checked` mirrors the checkbox.
#[derive(Clone, Debug)]
pub struct ChecklistItem {
	pub id: String,
	pub checked: RwSignal<bool>,
}

impl ChecklistItem {
	pub fn new(id: &str) -> Self {
		Self {
			id: id.to_owned(),
			checked: RwSignal::new(false),
		}
	}
}

/// A titled block whose body folds away when the title is clicked.
#[component]
pub fn CollapsibleList(title: &'static str, children: Children) -> impl IntoView {
	let open = RwSignal::new(true);

	view! {
		<section class="collapsible" class:collapsed=move || !open.get()>
			<h3 class="minimizer" on:click=move |_| open.update(|o| *o = !*o)>
				{title}
			</h3>
			{children()}
		</section>
	}
}

#[component]
pub fn Checklist(
	#[prop(into)] items: Signal<Vec<ChecklistItem>>,
	session: StoredValue<Rc<Session>, LocalStorage>,
) -> impl IntoView {
	view! {
		<ul class="file-list">
			<For each=move || items.get() key=|item| item.id.clone() let:item>
				<ChecklistRow item=item session=session />
			</For>
		</ul>
	}
}

/// State a checkbox settles on once its toggle request was answered.
///
/// A refused toggle flips the box back so it keeps showing the graph's state.
fn settled_state(requested: bool, answer: &Result<(), ToggleError>) -> bool {
	match answer {
		Ok(()) => requested,
		Err(_) => !requested,
	}
}

#[component]
fn ChecklistRow(item: ChecklistItem, session: StoredValue<Rc<Session>, LocalStorage>) -> impl IntoView {
	let ChecklistItem { id, checked } = item;
	let label = id.clone();

	let on_change = move |ev: leptos::ev::Event| {
		let requested = event_target_checked(&ev);
		let request = if requested {
			ToggleRequest::check(id.clone())
		} else {
			ToggleRequest::uncheck(id.clone())
		};
		let answer = session.with_value(|session| session.toggle(request));
		if let Err(err) = &answer {
			warn!("{err}");
		}
		let settled = settled_state(requested, &answer);
		if settled != requested {
			event_target::<HtmlInputElement>(&ev).set_checked(settled);
		}
		checked.set(settled);
	};

	view! {
		<li>
			<input type="checkbox" prop:checked=move || checked.get() on:change=on_change />
			" "
			{label}
		</li>
	}
}

#[component]
pub fn SelectionList(#[prop(into)] items: Signal<Vec<String>>) -> impl IntoView {
	view! {
		<ul class="selected-list">
			{move || {
				items
					.get()
					.into_iter()
					.map(|id| view! { <li>{id}</li> })
					.collect_view()
			}}
		</ul>
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::reference_graph::membership::Membership;

	#[test]
	fn accepted_toggle_keeps_the_requested_state() {
		assert!(settled_state(true, &Ok(())));
		assert!(!settled_state(false, &Ok(())));
	}

	#[test]
	fn refused_toggle_flips_the_box_back() {
		let busy = Err(ToggleError::Busy("B".into()));
		assert!(!settled_state(true, &busy));
		assert!(settled_state(false, &busy));
	}

	#[test]
	fn second_box_reverts_while_first_toggle_runs() {
		let membership = Membership::new();
		let held = membership
			.begin(ToggleRequest::uncheck("A"))
			.expect("lock is free");

		let answer = membership.begin(ToggleRequest::check("B")).map(drop);
		assert_eq!(answer, Err(ToggleError::Busy("B".into())));
		assert!(!settled_state(true, &answer));

		drop(held);
		let answer = membership.begin(ToggleRequest::check("B")).map(drop);
		assert!(settled_state(true, &answer));
	}
}
