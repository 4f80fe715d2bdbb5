use force_graph::SimulationParameters;

/// Colours used by the frame renderer. Any CSS colour string works.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
	pub background: String,
	pub edge: String,
	pub node: String,
	/// Nodes whose document is currently checked.
	pub member: String,
	/// Hover highlight.
	pub highlight: String,
}

impl Default for Palette {
	fn default() -> Self {
		Self {
			background: "white".into(),
			edge: "rgba(0, 0, 0, 0.333)".into(),
			node: "black".into(),
			member: "blue".into(),
			highlight: "red".into(),
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct SimulationConfig {
	pub force_charge: f32,
	pub force_spring: f32,
	pub force_max: f32,
	pub node_speed: f32,
	pub damping_factor: f32,
	/// Fraction of the distance to the origin removed per second from every free node.
	pub gravity: f32,
}

impl Default for SimulationConfig {
	fn default() -> Self {
		Self {
			force_charge: 100.0,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.5,
			gravity: 0.3,
		}
	}
}

impl From<&SimulationConfig> for SimulationParameters {
	fn from(config: &SimulationConfig) -> Self {
		SimulationParameters {
			force_charge: config.force_charge,
			force_spring: config.force_spring,
			force_max: config.force_max,
			node_speed: config.node_speed,
			damping_factor: config.damping_factor,
		}
	}
}

/// Everything the reference graph needs to know up front.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphConfig {
	/// URL of the reference listing (a JSON object of id -> referenced ids).
	pub endpoint: String,
	/// Whitespace kept free on every side of the canvas, in pixels.
	pub padding: f64,
	/// Pixel radius for hover, drag and save hit tests.
	pub hover_radius: f64,
	/// `KeyboardEvent.key` value that saves the node under the pointer.
	pub save_key: String,
	/// Inertia given to a node right after it is dropped; it relaxes back over later frames.
	pub release_mass: f32,
	/// Cap on the number of checklist entries; `None` lists every document.
	pub max_items: Option<usize>,
	pub simulation: SimulationConfig,
	pub palette: Palette,
}

impl Default for GraphConfig {
	fn default() -> Self {
		Self {
			endpoint: "all_papers".into(),
			padding: 80.0,
			hover_radius: 20.0,
			save_key: "s".into(),
			release_mass: 1000.0,
			max_items: None,
			simulation: SimulationConfig::default(),
			palette: Palette::default(),
		}
	}
}
