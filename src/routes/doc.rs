use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        addresses::{AddressList, CreateAddressRequest},
        maintenance::{
            CreateVehicleRequest, MaintenanceDetail, MaintenanceInput, MaintenanceList, PartInput,
            VehicleList,
        },
        orders::{
            LineItemRequest, OrderList, OrderWithItems, PlaceOrderRequest, PlacedOrder,
            PricingSummary,
        },
        products::{ProductDetail, ProductInput, ProductList, VariantInput},
    },
    models::{Address, Asset, Maintenance, MaintenancePart, Order, OrderItem, Product, ProductVariant, Vehicle},
    money::Money,
    response::{ApiResponse, ErrorCode},
    routes::{addresses, health, maintenances, orders, products, vehicles},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        orders::place_order,
        orders::list_orders,
        orders::get_order,
        addresses::list_addresses,
        addresses::create_address,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        vehicles::list_vehicles,
        vehicles::create_vehicle,
        vehicles::list_vehicle_maintenances,
        maintenances::create_maintenance,
        maintenances::update_maintenance,
        maintenances::get_maintenance
    ),
    components(
        schemas(
            Money,
            ErrorCode,
            Address,
            Asset,
            Order,
            OrderItem,
            Product,
            ProductVariant,
            Vehicle,
            Maintenance,
            MaintenancePart,
            AddressList,
            CreateAddressRequest,
            LineItemRequest,
            PricingSummary,
            PlaceOrderRequest,
            PlacedOrder,
            OrderList,
            OrderWithItems,
            VariantInput,
            ProductInput,
            ProductDetail,
            ProductList,
            PartInput,
            MaintenanceInput,
            MaintenanceDetail,
            MaintenanceList,
            CreateVehicleRequest,
            VehicleList,
            ApiResponse<PlacedOrder>,
            ApiResponse<OrderList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<ProductDetail>,
            ApiResponse<ProductList>,
            ApiResponse<MaintenanceDetail>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Orders", description = "Order placement and history"),
        (name = "Addresses", description = "Shipping addresses of the caller"),
        (name = "Products", description = "Catalog with variants and images"),
        (name = "Fleet", description = "Vehicles and completed maintenance records"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/orders",
            "/api/orders/{id}",
            "/api/addresses",
            "/api/products",
            "/api/products/{id}",
            "/api/vehicles",
            "/api/vehicles/{id}/maintenances",
            "/api/maintenances",
            "/api/maintenances/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing");
        }
    }
}
