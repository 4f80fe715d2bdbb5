pub mod reference_graph;
