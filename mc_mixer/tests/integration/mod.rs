mod config_startup;
mod node_pipeline;
mod properties;
