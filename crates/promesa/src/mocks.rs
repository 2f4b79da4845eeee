//! Canned backend payloads for the Promise Calculator suite.
//!
//! Fixed responses for the endpoints the application consumes: health
//! check, sales orders, item catalog, stock snapshot, and promise
//! evaluation. [`promise_backend_rules`] assembles them into the ordered
//! route table; [`router_for`] applies the live-backend escape hatch.

use crate::config::BrowserSettings;
use crate::routing::{CannedResponse, MockRule, MockRouter, UrlPattern};
use serde_json::{json, Value};

/// Item codes the application accepts
pub const VALID_ITEM_CODES: [&str; 5] = [
    "WIDGET-ALPHA",
    "WIDGET-BETA",
    "COMPONENT-X",
    "COMPONENT-Y",
    "GEAR-TYPE-A",
];

/// An item code the application must reject
pub const INVALID_ITEM_CODE: &str = "INVALID-ITEM-XYZ";

/// Warehouse used across all canned order lines
pub const DEFAULT_WAREHOUSE: &str = "Stores - SD";

/// Health-check payload
#[must_use]
pub fn health_response() -> Value {
    json!({
        "status": "healthy",
        "version": "1.0.0",
        "erpnext_connected": true,
        "timestamp": "2026-02-01T09:00:00",
    })
}

/// Sales-order collection payload
#[must_use]
pub fn sales_orders_list() -> Value {
    json!({
        "sales_orders": [
            {
                "name": "SAL-ORD-2026-00001",
                "customer": "Acme Corporation",
                "customer_name": "Acme Corporation",
                "so_date": "2026-02-01",
                "delivery_date": "2026-02-15",
                "item_count": 3,
                "grand_total": 15000.0,
                "status": "Draft",
            },
            {
                "name": "SAL-ORD-2026-00002",
                "customer": "Beta LLC",
                "customer_name": "Beta LLC",
                "so_date": "2026-02-02",
                "delivery_date": "2026-02-20",
                "item_count": 2,
                "grand_total": 8500.0,
                "status": "Draft",
            },
            {
                "name": "SAL-ORD-2026-00010",
                "customer": "Gamma Industries",
                "customer_name": "Gamma Industries",
                "so_date": "2026-02-03",
                "delivery_date": "2026-02-25",
                "item_count": 5,
                "grand_total": 22000.0,
                "status": "Draft",
            },
        ],
        "total": 3,
        "limit": 20,
        "offset": 0,
    })
}

/// Detail payload for SAL-ORD-2026-00001
#[must_use]
pub fn sales_order_detail_00001() -> Value {
    json!({
        "name": "SAL-ORD-2026-00001",
        "sales_order_id": "SAL-ORD-2026-00001",
        "customer": "Acme Corporation",
        "customer_name": "Acme Corporation",
        "transaction_date": "2026-02-01",
        "delivery_date": "2026-02-15",
        "status": "Draft",
        "items": [
            {
                "name": "SAL-ORD-2026-00001-0001",
                "item_code": "WIDGET-ALPHA",
                "item_name": "Widget Alpha",
                "description": "Premium alpha widget",
                "qty": 5,
                "uom": "NOS",
                "warehouse": DEFAULT_WAREHOUSE,
                "stock_actual": 20,
                "stock_reserved": 5,
                "stock_available": 15,
            },
            {
                "name": "SAL-ORD-2026-00001-0002",
                "item_code": "WIDGET-BETA",
                "item_name": "Widget Beta",
                "description": "Standard beta widget",
                "qty": 10,
                "uom": "NOS",
                "warehouse": DEFAULT_WAREHOUSE,
                "stock_actual": 50,
                "stock_reserved": 20,
                "stock_available": 30,
            },
            {
                "name": "SAL-ORD-2026-00001-0003",
                "item_code": "COMPONENT-X",
                "item_name": "Component X",
                "description": "Critical component",
                "qty": 3,
                "uom": "NOS",
                "warehouse": DEFAULT_WAREHOUSE,
                "stock_actual": 10,
                "stock_reserved": 0,
                "stock_available": 10,
            },
        ],
        "defaults": {
            "warehouse": DEFAULT_WAREHOUSE,
            "delivery_mode": "LATEST_ACCEPTABLE",
        },
    })
}

/// Detail payload for SAL-ORD-2026-00002
#[must_use]
pub fn sales_order_detail_00002() -> Value {
    json!({
        "name": "SAL-ORD-2026-00002",
        "sales_order_id": "SAL-ORD-2026-00002",
        "customer": "Beta LLC",
        "customer_name": "Beta LLC",
        "transaction_date": "2026-02-02",
        "delivery_date": "2026-02-20",
        "status": "Draft",
        "items": [
            {
                "name": "SAL-ORD-2026-00002-0001",
                "item_code": "COMPONENT-Y",
                "item_name": "Component Y",
                "description": "Secondary component",
                "qty": 8,
                "uom": "NOS",
                "warehouse": DEFAULT_WAREHOUSE,
                "stock_actual": 25,
                "stock_reserved": 10,
                "stock_available": 15,
            },
            {
                "name": "SAL-ORD-2026-00002-0002",
                "item_code": "GEAR-TYPE-A",
                "item_name": "Gear Type A",
                "description": "Standard gear",
                "qty": 6,
                "uom": "NOS",
                "warehouse": DEFAULT_WAREHOUSE,
                "stock_actual": 30,
                "stock_reserved": 6,
                "stock_available": 24,
            },
        ],
        "defaults": {
            "warehouse": DEFAULT_WAREHOUSE,
            "delivery_mode": "LATEST_ACCEPTABLE",
        },
    })
}

/// Item catalog payload, one entry per valid item code
#[must_use]
pub fn items_list() -> Value {
    json!({
        "items": [
            { "item_code": "WIDGET-ALPHA", "item_name": "Widget Alpha", "uom": "NOS" },
            { "item_code": "WIDGET-BETA", "item_name": "Widget Beta", "uom": "NOS" },
            { "item_code": "COMPONENT-X", "item_name": "Component X", "uom": "NOS" },
            { "item_code": "COMPONENT-Y", "item_name": "Component Y", "uom": "NOS" },
            { "item_code": "GEAR-TYPE-A", "item_name": "Gear Type A", "uom": "NOS" },
        ],
    })
}

/// Per-warehouse stock snapshot
#[must_use]
pub fn stock_levels() -> Value {
    json!({
        "items": [
            {
                "item_code": "WIDGET-ALPHA",
                "item_name": "Widget Alpha",
                "warehouses": [
                    { "warehouse": DEFAULT_WAREHOUSE, "stock": 20, "reserved": 5, "available": 15 },
                ],
            },
            {
                "item_code": "WIDGET-BETA",
                "item_name": "Widget Beta",
                "warehouses": [
                    { "warehouse": DEFAULT_WAREHOUSE, "stock": 50, "reserved": 20, "available": 30 },
                ],
            },
            {
                "item_code": "COMPONENT-X",
                "item_name": "Component X",
                "warehouses": [
                    { "warehouse": DEFAULT_WAREHOUSE, "stock": 10, "reserved": 0, "available": 10 },
                ],
            },
            {
                "item_code": "COMPONENT-Y",
                "item_name": "Component Y",
                "warehouses": [
                    { "warehouse": DEFAULT_WAREHOUSE, "stock": 25, "reserved": 10, "available": 15 },
                ],
            },
            {
                "item_code": "GEAR-TYPE-A",
                "item_name": "Gear Type A",
                "warehouses": [
                    { "warehouse": DEFAULT_WAREHOUSE, "stock": 30, "reserved": 6, "available": 24 },
                ],
            },
        ],
    })
}

/// Feasible promise evaluation
#[must_use]
pub fn promise_feasible() -> Value {
    json!({
        "request_id": "req-12345",
        "status": "FEASIBLE",
        "promise_date": "2026-02-18",
        "confidence_pct": 95,
        "confidence_level": "HIGH",
        "order_created_at": "2026-02-01T10:30:00",
        "desired_delivery_date": "2026-02-15",
        "calculated_promise_date": "2026-02-18",
        "factors": {
            "is_weekend_excluded": true,
            "is_holiday_checked": false,
            "buffer_applied_days": 1,
            "cutoff_time_applied": true,
        },
        "plan": [
            {
                "item_code": "WIDGET-ALPHA",
                "qty": 5,
                "warehouse": DEFAULT_WAREHOUSE,
                "available": 15,
                "lead_time_days": 1,
                "feasible": true,
            },
            {
                "item_code": "WIDGET-BETA",
                "qty": 10,
                "warehouse": DEFAULT_WAREHOUSE,
                "available": 30,
                "lead_time_days": 2,
                "feasible": true,
            },
            {
                "item_code": "COMPONENT-X",
                "qty": 3,
                "warehouse": DEFAULT_WAREHOUSE,
                "available": 10,
                "lead_time_days": 1,
                "feasible": true,
            },
        ],
        "message": "Promise date: 2026-02-18 (HIGH confidence)",
    })
}

/// At-risk promise evaluation
#[must_use]
pub fn promise_at_risk() -> Value {
    json!({
        "request_id": "req-12346",
        "status": "AT_RISK",
        "promise_date": "2026-02-20",
        "confidence_pct": 45,
        "confidence_level": "LOW",
        "order_created_at": "2026-02-01T10:30:00",
        "desired_delivery_date": "2026-02-15",
        "calculated_promise_date": "2026-02-20",
        "factors": {
            "is_weekend_excluded": true,
            "is_holiday_checked": false,
            "buffer_applied_days": 1,
            "cutoff_time_applied": true,
        },
        "plan": [
            {
                "item_code": "COMPONENT-Y",
                "qty": 8,
                "warehouse": DEFAULT_WAREHOUSE,
                "available": 15,
                "lead_time_days": 3,
                "feasible": false,
            },
        ],
        "message": "Promise date: 2026-02-20 (LOW confidence - delivery risk)",
    })
}

/// Not-feasible promise evaluation
#[must_use]
pub fn promise_not_feasible() -> Value {
    json!({
        "request_id": "req-12347",
        "status": "NOT_FEASIBLE",
        "promise_date": null,
        "confidence_pct": 0,
        "confidence_level": "CRITICAL",
        "order_created_at": "2026-02-01T10:30:00",
        "desired_delivery_date": "2026-02-10",
        "calculated_promise_date": null,
        "factors": {
            "is_weekend_excluded": true,
            "is_holiday_checked": false,
            "buffer_applied_days": 1,
            "cutoff_time_applied": true,
        },
        "plan": [],
        "message": "Cannot fulfill: desired date is in past or insufficient stock",
    })
}

/// The ordered route table for the Promise Calculator backend.
///
/// Order is load-bearing: the specific sales-order-detail rules precede
/// the generic collection rule whose substring they also contain.
#[must_use]
pub fn promise_backend_rules() -> Vec<MockRule> {
    vec![
        MockRule::new(
            "health",
            UrlPattern::Contains("/health".to_string()),
            CannedResponse::json(&health_response()),
        ),
        MockRule::new(
            "sales-order-detail-00001",
            UrlPattern::Contains("/otp/sales-orders/SAL-ORD-2026-00001".to_string()),
            CannedResponse::json(&sales_order_detail_00001()),
        ),
        MockRule::new(
            "sales-order-detail-00002",
            UrlPattern::Contains("/otp/sales-orders/SAL-ORD-2026-00002".to_string()),
            CannedResponse::json(&sales_order_detail_00002()),
        ),
        MockRule::new(
            "sales-order-list",
            UrlPattern::Contains("/otp/sales-orders".to_string()),
            CannedResponse::json(&sales_orders_list()),
        ),
        MockRule::new(
            "items",
            UrlPattern::Contains("/otp/items".to_string()),
            CannedResponse::json(&items_list()),
        ),
        MockRule::new(
            "stock",
            UrlPattern::Contains("/otp/stock".to_string()),
            CannedResponse::json(&stock_levels()),
        ),
        MockRule::new(
            "promise-evaluation",
            UrlPattern::Contains("/otp/promise".to_string()),
            CannedResponse::json(&promise_feasible()),
        ),
    ]
}

/// Build the router a context should use under the given settings:
/// the full canned backend, or a pass-through router when the suite is
/// pointed at a live ERP.
#[must_use]
pub fn router_for(settings: &BrowserSettings) -> MockRouter {
    if settings.use_live_backend {
        MockRouter::passthrough()
    } else {
        MockRouter::new(promise_backend_rules())
    }
}
