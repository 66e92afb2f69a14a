use chrono::{Duration, Utc};
use fleetshop_api::{
    config::AppConfig,
    db::{DbPool, create_pool, run_migrations},
    dto::auth::Claims,
    middleware::auth::ROLE_ADMIN,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

const ROLE_CUSTOMER: &str = "customer";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&pool).await?;

    let admin_id = ensure_user(&pool, "admin@example.com", ROLE_ADMIN).await?;
    let customer_id = ensure_user(&pool, "customer@example.com", ROLE_CUSTOMER).await?;
    seed_products(&pool).await?;
    seed_vehicles(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, Customer ID: {customer_id}");
    println!("Admin token:    {}", dev_token(&config, admin_id, ROLE_ADMIN)?);
    println!("Customer token: {}", dev_token(&config, customer_id, ROLE_CUSTOMER)?);
    Ok(())
}

async fn ensure_user(pool: &DbPool, email: &str, role: &str) -> anyhow::Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, role)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(role)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

async fn seed_products(pool: &DbPool) -> anyhow::Result<()> {
    let products = [
        (
            "Fleet Jacket",
            "Reflective jacket for drivers",
            8900_i64,
            &[("navy", "M", 20), ("navy", "L", 15)][..],
        ),
        (
            "Cab Mug",
            "Keeps coffee warm on long routes",
            1500,
            &[("black", "one-size", 100)][..],
        ),
    ];

    for (name, desc, price, variants) in products {
        let (product_id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO products (id, name, description, base_price)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name) DO UPDATE SET updated_at = NOW()
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(desc)
        .bind(price)
        .fetch_one(pool)
        .await?;

        for &(color, size, stock) in variants {
            let sku = format!(
                "{}-{}-{}",
                name.to_ascii_uppercase().replace(' ', "-"),
                color.to_ascii_uppercase(),
                size.to_ascii_uppercase()
            );
            sqlx::query(
                r#"
                INSERT INTO product_variants (id, product_id, color, size, sku, stock_quantity)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (sku) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(product_id)
            .bind(color)
            .bind(size)
            .bind(sku)
            .bind(stock)
            .execute(pool)
            .await?;
        }
    }

    println!("Seeded products");
    Ok(())
}

async fn seed_vehicles(pool: &DbPool) -> anyhow::Result<()> {
    let vehicles = [
        ("B-1234-XY", "Toyota", "Hiace", 2021),
        ("D-778-QA", "Isuzu", "Elf", 2019),
    ];
    for (plate, make, model, year) in vehicles {
        sqlx::query(
            r#"
            INSERT INTO vehicles (id, plate_number, make, model, year)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (plate_number) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(plate)
        .bind(make)
        .bind(model)
        .bind(year)
        .execute(pool)
        .await?;
    }

    println!("Seeded vehicles");
    Ok(())
}

fn dev_token(config: &AppConfig, user_id: Uuid, role: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        exp: (Utc::now() + Duration::days(7)).timestamp() as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )?;
    Ok(token)
}
