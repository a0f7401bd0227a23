pub use super::eve_alliance::Entity as EveAlliance;
pub use super::eve_blueprint_material::Entity as EveBlueprintMaterial;
pub use super::eve_blueprint_product::Entity as EveBlueprintProduct;
pub use super::eve_character::Entity as EveCharacter;
pub use super::eve_constellation::Entity as EveConstellation;
pub use super::eve_corporation::Entity as EveCorporation;
pub use super::eve_region::Entity as EveRegion;
pub use super::eve_solar_system::Entity as EveSolarSystem;
pub use super::eve_type::Entity as EveType;
pub use super::eve_type_attribute::Entity as EveTypeAttribute;
pub use super::eve_type_category::Entity as EveTypeCategory;
pub use super::eve_type_flag::Entity as EveTypeFlag;
pub use super::eve_type_group::Entity as EveTypeGroup;
pub use super::killmail::Entity as Killmail;
pub use super::killmail_attacker::Entity as KillmailAttacker;
pub use super::killmail_item::Entity as KillmailItem;
pub use super::killmail_victim::Entity as KillmailVictim;
pub use super::market_history::Entity as MarketHistory;
pub use super::market_price_built::Entity as MarketPriceBuilt;
