mod common;

use fleetshop_api::{
    dto::products::{ProductInput, VariantInput},
    entity::{ProductImages, ProductVariants, Products},
    error::AppError,
    money::Money,
    response::ErrorCode,
    routes::params::ProductQuery,
    services::product_service,
};
use sea_orm::{EntityTrait, PaginatorTrait};
use uuid::Uuid;

use common::{BROKEN_UPLOAD, admin, customer, file, setup};

fn variant(sku: &str, stock: i32) -> VariantInput {
    VariantInput {
        id: None,
        color: "black".into(),
        size: sku.rsplit('-').next().unwrap_or("M").into(),
        sku: sku.into(),
        price_adjustment: Money::ZERO,
        stock_quantity: stock,
    }
}

fn product(name: &str, variants: Vec<VariantInput>) -> ProductInput {
    ProductInput {
        name: name.into(),
        description: Some("Sturdy".into()),
        base_price: Money::from_cents(4500),
        variants,
        retained_image_ids: None,
    }
}

#[tokio::test]
async fn create_stores_images_and_rows() -> anyhow::Result<()> {
    let app = setup().await?;
    let state = &app.state;
    let admin = admin(state).await?;

    let detail = product_service::create_product(
        state,
        &admin,
        product("Work Boots", vec![variant("BOOT-42", 4), variant("BOOT-43", 2)]),
        vec![file("front.JPG", b"front"), file("side.png", b"side")],
    )
    .await?
    .data
    .expect("product detail");

    assert_eq!(detail.variants.len(), 2);
    assert_eq!(detail.images.len(), 2);
    for image in &detail.images {
        assert!(image.url.starts_with("/uploads/"), "{}", image.url);
    }
    assert!(detail.images.iter().any(|i| i.original_name == "front.JPG" && i.url.ends_with(".jpg")));
    assert_eq!(app.stored_files(), 2);
    Ok(())
}

#[tokio::test]
async fn failed_transaction_removes_uploaded_files() -> anyhow::Result<()> {
    let app = setup().await?;
    let state = &app.state;
    let admin = admin(state).await?;
    product_service::create_product(state, &admin, product("Gloves", vec![variant("GLV-M", 5)]), vec![])
        .await?;

    // same SKU under a new product name fails inside the transaction
    let err = product_service::create_product(
        state,
        &admin,
        product("Gloves Pro", vec![variant("GLV-M", 1)]),
        vec![file("a.png", b"a"), file("b.png", b"b")],
    )
    .await
    .expect_err("duplicate sku");

    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(app.stored_files(), 0);
    assert_eq!(Products::find().count(&state.orm).await?, 1);
    assert_eq!(ProductImages::find().count(&state.orm).await?, 0);
    Ok(())
}

#[tokio::test]
async fn duplicate_name_is_rejected_before_upload() -> anyhow::Result<()> {
    let app = setup().await?;
    let state = &app.state;
    let admin = admin(state).await?;
    product_service::create_product(state, &admin, product("Helmet", vec![variant("HLM-L", 1)]), vec![])
        .await?;

    let err = product_service::create_product(
        state,
        &admin,
        product("Helmet", vec![variant("HLM-XL", 1)]),
        vec![file("h.png", b"h")],
    )
    .await
    .expect_err("duplicate name");

    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(app.stored_files(), 0);
    Ok(())
}

#[tokio::test]
async fn all_uploads_failing_rejects_the_request() -> anyhow::Result<()> {
    let app = setup().await?;
    let state = &app.state;
    let admin = admin(state).await?;

    let err = product_service::create_product(
        state,
        &admin,
        product("Vest", vec![variant("VST-M", 3)]),
        vec![file("a.png", BROKEN_UPLOAD), file("b.png", BROKEN_UPLOAD)],
    )
    .await
    .expect_err("no uploads stored");

    assert_eq!(err.code(), ErrorCode::UploadFailed);
    assert_eq!(Products::find().count(&state.orm).await?, 0);
    assert_eq!(ProductVariants::find().count(&state.orm).await?, 0);
    Ok(())
}

#[tokio::test]
async fn one_failed_upload_keeps_the_rest() -> anyhow::Result<()> {
    let app = setup().await?;
    let state = &app.state;
    let admin = admin(state).await?;

    let detail = product_service::create_product(
        state,
        &admin,
        product("Cap", vec![variant("CAP-S", 3)]),
        vec![
            file("ok-1.png", b"one"),
            file("bad.png", BROKEN_UPLOAD),
            file("ok-2.png", b"two"),
        ],
    )
    .await?
    .data
    .expect("product detail");

    assert_eq!(detail.images.len(), 2);
    assert!(detail.images.iter().all(|image| image.original_name != "bad.png"));
    assert_eq!(app.stored_files(), 2);
    Ok(())
}

#[tokio::test]
async fn update_drops_unretained_images() -> anyhow::Result<()> {
    let app = setup().await?;
    let state = &app.state;
    let admin = admin(state).await?;

    let created = product_service::create_product(
        state,
        &admin,
        product("Raincoat", vec![variant("RC-M", 2)]),
        vec![file("a.png", b"A"), file("b.png", b"B"), file("c.png", b"C")],
    )
    .await?
    .data
    .expect("product detail");
    let image = |name: &str| {
        created
            .images
            .iter()
            .find(|i| i.original_name == name)
            .cloned()
            .expect("image")
    };
    let (a, b, c) = (image("a.png"), image("b.png"), image("c.png"));
    let b_file = b.url.rsplit('/').next().unwrap_or_default().to_string();
    assert!(app.file_exists(&b_file).await);

    let mut input = product("Raincoat", vec![]);
    input.variants = created
        .variants
        .iter()
        .map(|v| VariantInput {
            id: Some(v.id),
            stock_quantity: 7,
            ..variant(&v.sku, 0)
        })
        .collect();
    input.retained_image_ids = Some(vec![a.id, c.id]);

    let updated = product_service::update_product(state, &admin, created.product.id, input, vec![])
        .await?
        .data
        .expect("product detail");

    let remaining: Vec<Uuid> = updated.images.iter().map(|i| i.id).collect();
    assert_eq!(remaining.len(), 2);
    assert!(remaining.contains(&a.id) && remaining.contains(&c.id));
    assert!(!app.file_exists(&b_file).await);
    assert_eq!(app.stored_files(), 2);
    assert_eq!(updated.variants[0].stock_quantity, 2);
    Ok(())
}

#[tokio::test]
async fn update_leaves_existing_stock_alone() -> anyhow::Result<()> {
    let app = setup().await?;
    let state = &app.state;
    let admin = admin(state).await?;

    let created = product_service::create_product(
        state,
        &admin,
        product("Fleece", vec![variant("FL-M", 3)]),
        vec![],
    )
    .await?
    .data
    .expect("product detail");
    let existing = &created.variants[0];

    let mut input = product("Fleece", vec![]);
    input.variants = vec![
        VariantInput {
            id: Some(existing.id),
            color: "navy".into(),
            stock_quantity: 99,
            ..variant("FL-M", 0)
        },
        variant("FL-L", 4),
    ];

    let updated = product_service::update_product(state, &admin, created.product.id, input, vec![])
        .await?
        .data
        .expect("product detail");

    let kept = updated
        .variants
        .iter()
        .find(|v| v.id == existing.id)
        .expect("existing variant");
    assert_eq!(kept.color, "navy");
    assert_eq!(kept.stock_quantity, 3);

    let added = updated
        .variants
        .iter()
        .find(|v| v.sku == "FL-L")
        .expect("new variant");
    assert_eq!(added.stock_quantity, 4);
    Ok(())
}

#[tokio::test]
async fn update_without_retained_list_keeps_images() -> anyhow::Result<()> {
    let app = setup().await?;
    let state = &app.state;
    let admin = admin(state).await?;
    let created = product_service::create_product(
        state,
        &admin,
        product("Scarf", vec![variant("SCF-M", 2)]),
        vec![file("a.png", b"A")],
    )
    .await?
    .data
    .expect("product detail");

    let updated = product_service::update_product(
        state,
        &admin,
        created.product.id,
        product("Scarf", vec![variant("SCF-L", 1)]),
        vec![file("b.png", b"B")],
    )
    .await?
    .data
    .expect("product detail");

    assert_eq!(updated.images.len(), 2);
    assert_eq!(updated.variants.len(), 2);
    Ok(())
}

#[tokio::test]
async fn customers_cannot_manage_products() -> anyhow::Result<()> {
    let app = setup().await?;
    let state = &app.state;
    let user = customer(state, "buyer@example.com").await?;

    let err = product_service::create_product(
        state,
        &user,
        product("Sneakers", vec![variant("SNK-40", 1)]),
        vec![file("s.png", b"s")],
    )
    .await
    .expect_err("forbidden");

    assert_eq!(err.code(), ErrorCode::Forbidden);
    assert_eq!(app.stored_files(), 0);
    Ok(())
}

#[tokio::test]
async fn deactivated_products_leave_the_default_listing() -> anyhow::Result<()> {
    let app = setup().await?;
    let state = &app.state;
    let admin = admin(state).await?;
    let kept = product_service::create_product(state, &admin, product("Belt", vec![variant("BLT-M", 1)]), vec![])
        .await?
        .data
        .expect("product detail");
    let dropped = product_service::create_product(state, &admin, product("Tie", vec![variant("TIE-M", 1)]), vec![])
        .await?
        .data
        .expect("product detail");

    product_service::deactivate_product(state, &admin, dropped.product.id).await?;

    let listed = product_service::list_products(state, ProductQuery::default())
        .await?
        .data
        .expect("product list");
    assert_eq!(listed.items.len(), 1);
    assert_eq!(listed.items[0].product.id, kept.product.id);

    let all = product_service::list_products(
        state,
        ProductQuery {
            include_inactive: Some(true),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("product list");
    assert_eq!(all.items.len(), 2);
    Ok(())
}
