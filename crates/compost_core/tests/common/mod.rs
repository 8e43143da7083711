//! Transporte em memória para os testes de integração.

#![allow(dead_code)]

use compost_core::config::TransportConfig;
use compost_core::session::{SessionEvent, SessionObserver};
use compost_core::transport::{Transport, TransportError};
use std::cell::RefCell;
use std::rc::Rc;

/// Registra cada chamada feita pela sessão.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    pub connects: usize,
    pub disconnects: usize,
    pub subscriptions: Vec<String>,
    pub published: Vec<(String, Vec<u8>)>,
    pub refuse_connect: bool,
    pub refuse_subscribe: bool,
}

impl Transport for RecordingTransport {
    fn connect(&mut self, config: &TransportConfig) -> Result<(), TransportError> {
        if self.refuse_connect {
            return Err(TransportError::InvalidAddress(config.broker_address.clone()));
        }
        self.connects += 1;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.disconnects += 1;
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        if self.refuse_subscribe {
            return Err(TransportError::Client("subscribe refused".into()));
        }
        self.subscriptions.push(topic.to_string());
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        self.published.push((topic.to_string(), payload));
        Ok(())
    }
}

/// Observer que guarda os eventos num buffer compartilhado.
#[derive(Clone, Default)]
pub struct EventLog(pub Rc<RefCell<Vec<SessionEvent>>>);

impl EventLog {
    pub fn events(&self) -> Vec<SessionEvent> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl SessionObserver for EventLog {
    fn notify(&mut self, event: &SessionEvent) {
        self.0.borrow_mut().push(event.clone());
    }
}
