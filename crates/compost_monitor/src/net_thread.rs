//! Transporte MQTT: thread de rede que roda o event loop do rumqttc e
//! envia os eventos do link para a thread principal via channel.
//!
//! Cada `connect` abre um cliente novo com um número de geração; eventos
//! de clientes anteriores são descartados pela thread principal.
//!
//! Leituras vão por um channel limitado (descarta se cheio). Eventos de
//! conexão vão por um channel próprio, sem limite, para a thread de rede
//! nunca bloquear enquanto a principal espera o cliente.

use compost_core::config::TransportConfig;
use compost_core::transport::{Transport, TransportError, TransportEvent};
use crossbeam_channel::Sender;
use rumqttc::{Client, Connection, ConnectionError, Event, MqttOptions, Packet, QoS};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Keep-alive mínimo aceito pelo cliente.
const MIN_KEEP_ALIVE_SECS: u64 = 5;

/// Capacidade da fila de requisições do cliente.
const REQUEST_CAPACITY: usize = 16;

/// Mensagem enviada da thread de rede para a thread principal.
#[derive(Debug, Clone)]
pub struct NetMessage {
    pub generation: u64,
    pub event: TransportEvent,
}

/// Lados de envio dos dois channels da thread de rede.
#[derive(Debug, Clone)]
pub struct NetSenders {
    /// Leituras do dispositivo (limitado)
    pub readings: Sender<NetMessage>,
    /// Eventos de conexão (sem limite)
    pub lifecycle: Sender<NetMessage>,
}

struct Link {
    client: Client,
    stop: Arc<AtomicBool>,
}

/// [`Transport`] sobre MQTT (rumqttc, API síncrona).
pub struct MqttTransport {
    tx: NetSenders,
    generation: u64,
    link: Option<Link>,
}

impl MqttTransport {
    pub fn new(tx: NetSenders) -> Self {
        Self {
            tx,
            generation: 0,
            link: None,
        }
    }

    /// `true` se o evento veio do cliente atual.
    pub fn is_current(&self, generation: u64) -> bool {
        self.link.is_some() && generation == self.generation
    }

    fn client(&mut self) -> Result<&mut Client, TransportError> {
        self.link
            .as_mut()
            .map(|link| &mut link.client)
            .ok_or(TransportError::NotOpen)
    }
}

impl Transport for MqttTransport {
    fn connect(&mut self, config: &TransportConfig) -> Result<(), TransportError> {
        self.disconnect();

        if config.broker_address.trim().is_empty() || config.port == 0 {
            return Err(TransportError::InvalidAddress(format!(
                "{}:{}",
                config.broker_address, config.port
            )));
        }

        self.generation += 1;
        let client_id = config.client_id();
        let mut options = MqttOptions::new(&client_id, config.broker_address.trim(), config.port);
        options.set_keep_alive(Duration::from_secs(
            config.keep_alive_secs.max(MIN_KEEP_ALIVE_SECS),
        ));
        options.set_clean_session(true);

        let (client, connection) = Client::new(options, REQUEST_CAPACITY);
        let stop = Arc::new(AtomicBool::new(false));
        let retry = Duration::from_secs_f64(config.reconnect_secs.max(0.5));

        let tx = self.tx.clone();
        let generation = self.generation;
        let thread_stop = Arc::clone(&stop);
        std::thread::Builder::new()
            .name(format!("mqtt-{generation}"))
            .spawn(move || event_loop(connection, &tx, generation, &thread_stop, retry))
            .map_err(|e| TransportError::Client(format!("Falha ao criar thread de rede: {e}")))?;

        info!(
            "Cliente MQTT {client_id} → {}:{}",
            config.broker_address, config.port
        );
        self.link = Some(Link { client, stop });
        Ok(())
    }

    fn disconnect(&mut self) {
        if let Some(link) = self.link.take() {
            link.stop.store(true, Ordering::Relaxed);
            if let Err(e) = link.client.try_disconnect() {
                debug!("Disconnect MQTT: {e}");
            }
        }
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        self.client()?
            .try_subscribe(topic, QoS::AtMostOnce)
            .map_err(|e| TransportError::Client(e.to_string()))
    }

    fn publish(&mut self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        self.client()?
            .try_publish(topic, QoS::AtMostOnce, false, payload)
            .map_err(|e| TransportError::Client(e.to_string()))
    }
}

fn event_loop(
    mut connection: Connection,
    tx: &NetSenders,
    generation: u64,
    stop: &AtomicBool,
    retry: Duration,
) {
    let mut acknowledged = false;

    for notification in connection.iter() {
        if stop.load(Ordering::Relaxed) {
            break;
        }

        let event = match notification {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                acknowledged = true;
                TransportEvent::Acknowledged
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => TransportEvent::Message {
                topic: publish.topic.clone(),
                payload: publish.payload.to_vec(),
            },
            Ok(Event::Incoming(Packet::Disconnect)) => {
                acknowledged = false;
                TransportEvent::Closed
            }
            Ok(_) => continue,
            Err(e) => {
                let event = classify_error(&e, acknowledged);
                acknowledged = false;
                forward(tx, generation, event);

                // O próximo `next()` reconecta; espera o período de retry antes
                std::thread::sleep(retry);
                if stop.load(Ordering::Relaxed) {
                    break;
                }
                TransportEvent::AutoRetry
            }
        };

        forward(tx, generation, event);
    }

    debug!("Event loop MQTT #{generation} encerrado");
}

/// Erro durante o handshake = rejeição/timeout; depois dele = queda.
fn classify_error(error: &ConnectionError, acknowledged: bool) -> TransportEvent {
    match error {
        _ if acknowledged => TransportEvent::Error(error.to_string()),
        ConnectionError::NetworkTimeout => TransportEvent::TimedOut,
        _ => TransportEvent::Rejected(error.to_string()),
    }
}

fn forward(tx: &NetSenders, generation: u64, event: TransportEvent) {
    let message = NetMessage { generation, event };
    if matches!(message.event, TransportEvent::Message { .. }) {
        // Non-blocking: se a thread principal está lenta, descarta leituras
        if tx.readings.try_send(message).is_err() {
            debug!("Channel cheio, descartando mensagem");
        }
    } else if tx.lifecycle.send(message).is_err() {
        warn!("Thread principal encerrada, evento de conexão perdido");
    }
}
