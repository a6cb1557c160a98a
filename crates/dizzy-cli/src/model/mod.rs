pub mod strategy_model;
