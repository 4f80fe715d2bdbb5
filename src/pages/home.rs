use leptos::prelude::*;

use crate::components::reference_graph::{GraphConfig, ReferenceGraph};

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let config = GraphConfig::default();

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<ReferenceGraph config=config fullscreen=true />
				<div class="graph-overlay">
					<h1>"Reference Graph"</h1>
					<p class="subtitle">
						"Check documents to pull in their references. Drag nodes to move them. Press s over a node to save it."
					</p>
				</div>
			</div>
		</ErrorBoundary>
	}
}
