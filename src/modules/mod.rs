pub mod friend {
    pub mod schema;
    pub mod model;
    pub mod repository;
    pub mod repository_pg;
    pub mod repository_memory;
    pub mod store;
    pub mod handle;
    pub mod service;
    pub mod route;
}
