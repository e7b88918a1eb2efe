pub mod application;
pub mod auth;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod models;
pub mod schema;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::auth_service::AuthService;
use application::cart_service::CartService;
use application::category_service::CategoryService;
use application::order_service::OrderService;
use application::product_service::ProductService;
use infrastructure::cart_repo::DieselCartRepository;
use infrastructure::category_repo::DieselCategoryRepository;
use infrastructure::order_repo::DieselOrderRepository;
use infrastructure::product_repo::DieselProductRepository;
use infrastructure::user_repo::DieselUserRepository;

pub use auth::JwtConfig;
pub use db::{create_pool, DbPool};

pub type AppAuthService = AuthService<DieselUserRepository>;
pub type AppCategoryService = CategoryService<DieselCategoryRepository>;
pub type AppProductService = ProductService<DieselProductRepository>;
pub type AppCartService = CartService<DieselCartRepository>;
pub type AppOrderService = OrderService<DieselOrderRepository>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) {
    let mut conn = pool.get().expect("Failed to get DB connection for migrations");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run database migrations");
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::me,
        handlers::categories::list_categories,
        handlers::categories::get_category,
        handlers::categories::create_category,
        handlers::categories::update_category,
        handlers::categories::delete_category,
        handlers::products::list_products,
        handlers::products::get_product,
        handlers::products::create_product,
        handlers::products::update_product,
        handlers::products::delete_product,
        handlers::cart::get_cart,
        handlers::cart::add_to_cart,
        handlers::cart::update_cart_item,
        handlers::cart::remove_cart_item,
        handlers::cart::clear_cart,
        handlers::orders::create_order,
        handlers::orders::my_orders,
        handlers::orders::get_order,
        handlers::orders::list_orders,
        handlers::orders::update_order_status,
    ),
    tags(
        (name = "auth", description = "Registration, login, current user"),
        (name = "categories", description = "Category catalog"),
        (name = "products", description = "Product catalog"),
        (name = "cart", description = "Per-user cart"),
        (name = "orders", description = "Order placement and lifecycle"),
    )
)]
pub struct ApiDoc;

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    pool: DbPool,
    jwt: JwtConfig,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let auth_service = web::Data::new(AuthService::new(DieselUserRepository::new(pool.clone())));
    let category_service = web::Data::new(CategoryService::new(DieselCategoryRepository::new(
        pool.clone(),
    )));
    let product_service = web::Data::new(ProductService::new(DieselProductRepository::new(
        pool.clone(),
    )));
    let cart_service = web::Data::new(CartService::new(DieselCartRepository::new(pool.clone())));
    let order_service = web::Data::new(OrderService::new(DieselOrderRepository::new(pool)));
    let jwt = web::Data::new(jwt);

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(auth_service.clone())
            .app_data(category_service.clone())
            .app_data(product_service.clone())
            .app_data(cart_service.clone())
            .app_data(order_service.clone())
            .app_data(jwt.clone())
            .wrap(Logger::default())
            .service(
                web::scope("/api")
                    .service(
                        web::scope("/auth")
                            .route("/register", web::post().to(handlers::auth::register))
                            .route("/login", web::post().to(handlers::auth::login))
                            .route("/me", web::get().to(handlers::auth::me)),
                    )
                    .service(
                        web::scope("/categories")
                            .route("", web::get().to(handlers::categories::list_categories))
                            .route("", web::post().to(handlers::categories::create_category))
                            .route("/{id}", web::get().to(handlers::categories::get_category))
                            .route("/{id}", web::put().to(handlers::categories::update_category))
                            .route(
                                "/{id}",
                                web::delete().to(handlers::categories::delete_category),
                            ),
                    )
                    .service(
                        web::scope("/products")
                            .route("", web::get().to(handlers::products::list_products))
                            .route("", web::post().to(handlers::products::create_product))
                            .route("/{id}", web::get().to(handlers::products::get_product))
                            .route("/{id}", web::put().to(handlers::products::update_product))
                            .route("/{id}", web::delete().to(handlers::products::delete_product)),
                    )
                    .service(
                        web::scope("/cart")
                            .route("", web::get().to(handlers::cart::get_cart))
                            .route("", web::post().to(handlers::cart::add_to_cart))
                            .route("", web::delete().to(handlers::cart::clear_cart))
                            .route("/{id}", web::put().to(handlers::cart::update_cart_item))
                            .route("/{id}", web::delete().to(handlers::cart::remove_cart_item)),
                    )
                    .service(
                        web::scope("/orders")
                            // "/my-orders" must be registered before "/{id}".
                            .route("/my-orders", web::get().to(handlers::orders::my_orders))
                            .route("", web::post().to(handlers::orders::create_order))
                            .route("", web::get().to(handlers::orders::list_orders))
                            .route(
                                "/{id}/status",
                                web::put().to(handlers::orders::update_order_status),
                            )
                            .route("/{id}", web::get().to(handlers::orders::get_order)),
                    ),
            )
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
