// Catalog services
pub mod categories;
pub mod products;
pub mod wholesalers;

// Rates
pub mod gold_rates;

// Transactional documents
pub mod documents;

// Administration
pub mod access;
pub mod users;
