pub mod aggregation_service;
pub mod inventory_service;
pub mod transition_service;
pub mod view_service;
