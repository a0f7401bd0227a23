pub mod prelude;

pub mod eve_alliance;
pub mod eve_blueprint_material;
pub mod eve_blueprint_product;
pub mod eve_character;
pub mod eve_constellation;
pub mod eve_corporation;
pub mod eve_region;
pub mod eve_solar_system;
pub mod eve_type;
pub mod eve_type_attribute;
pub mod eve_type_category;
pub mod eve_type_flag;
pub mod eve_type_group;
pub mod killmail;
pub mod killmail_attacker;
pub mod killmail_item;
pub mod killmail_victim;
pub mod market_history;
pub mod market_price_built;
