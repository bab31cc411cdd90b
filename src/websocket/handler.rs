use actix::dev::ToEnvelope;
use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::{info, warn};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::RelayError;
use crate::models::ServerMessage;
use crate::state::{ChatServer, Connection};

/// Text line pushed from the relay to one client.
#[derive(Message)]
#[rtype(result = "()")]
pub struct RelayText(pub String);

/// Any actor that accepts `RelayText` can be registered as a connection.
impl<A> Connection for Addr<A>
where
    A: Actor + Handler<RelayText>,
    A::Context: ToEnvelope<A, RelayText>,
{
    fn send_text(&self, text: &str) -> Result<(), RelayError> {
        match self.try_send(RelayText(text.to_string())) {
            Ok(()) => Ok(()),
            // Mailbox is only full, the actor is alive
            Err(SendError::Full(msg)) => {
                self.do_send(msg);
                Ok(())
            }
            Err(SendError::Closed(_)) => Err(RelayError::DeliveryFailure),
        }
    }
}

/// WebSocket actor for one chat client
pub struct RelayWebSocket {
    pub id: Uuid,
    pub requested_name: String,
    pub server: web::Data<ChatServer>,
}

impl Actor for RelayWebSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let name = self
            .server
            .register(self.id, Box::new(ctx.address()), &self.requested_name);
        info!("WebSocket connection started: {} as {}", self.id, name);
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        self.server.unregister(self.id);
        info!("WebSocket connection closed: {}", self.id);
        Running::Stop
    }
}

impl Handler<RelayText> for RelayWebSocket {
    type Result = ();

    fn handle(&mut self, msg: RelayText, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

// WebSocket message handler
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for RelayWebSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {}
            Ok(ws::Message::Text(text)) => {
                self.server.handle_message(self.id, &text);
            }
            Ok(ws::Message::Binary(_)) => {
                warn!("Binary message from {} ignored", self.id);
                ctx.text(
                    ServerMessage::System("Mensagens binárias não são suportadas.".to_string())
                        .to_string(),
                );
            }
            Ok(ws::Message::Close(reason)) => {
                info!("Connection {} closed: {:?}", self.id, reason);
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) | Ok(ws::Message::Nop) => {}
            Err(e) => {
                warn!("Protocol error on {}: {}", self.id, e);
                ctx.stop();
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub username: Option<String>,
}

/// WebSocket connection handler
pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    query: web::Query<ConnectQuery>,
    server: web::Data<ChatServer>,
) -> Result<HttpResponse, Error> {
    let id = Uuid::new_v4();
    info!("New WebSocket connection request: {}", id);

    let ws = RelayWebSocket {
        id,
        requested_name: query.into_inner().username.unwrap_or_default(),
        server: server.clone(),
    };
    ws::start(ws, &req, stream)
}
