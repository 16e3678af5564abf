//! # Handlers del Gateway
//! src/handlers/gateway.rs

use crate::gateway::{Gateway, SensorData};
use crate::http::{Request, Response, StatusCode};
use crate::router::HandlerResult;

/// `GET /api/gateway/health`
pub fn health_handler(_req: &Request) -> HandlerResult {
    Ok(Response::text("Gateway service is running"))
}

/// `GET /api/gateway/sensor`: solo la lectura
pub fn sensor_handler(_req: &Request, gateway: &Gateway) -> HandlerResult {
    let data = gateway.sensor_data();
    Ok(Response::json(&serde_json::to_string(&data)?))
}

/// `GET /api/gateway/data`: lectura + analytics
///
/// # Ejemplo de response
/// ```json
/// {"sensor_data": {"sensor_id": "S-01", ...}, "analytics": {"status": "success", ...}}
/// ```
pub fn data_handler(_req: &Request, gateway: &Gateway) -> HandlerResult {
    let combined = gateway.combined();
    Ok(Response::json(&serde_json::to_string(&combined)?))
}

/// `POST /api/gateway/analytics`: analytics de la lectura enviada en el body
pub fn analytics_handler(req: &Request, gateway: &Gateway) -> HandlerResult {
    let data: SensorData = match serde_json::from_slice(req.body()) {
        Ok(data) => data,
        Err(e) => {
            tracing::warn!(error = %e, "lectura inválida en el body");
            return Ok(Response::error(
                StatusCode::BadRequest,
                "ERROR: body must be a JSON sensor reading\n",
            ));
        }
    };

    let analytics = gateway.analyze(&data);
    Ok(Response::json(&serde_json::to_string(&analytics)?))
}
